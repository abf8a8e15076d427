// ── Name lookups for compliance checks ──
//
// A compliance check reads TXT and CNAME data either from the provider's
// record listing (what is configured) or from live DNS (what receivers
// see). Both sit behind `DnsLookup`.

use std::future::Future;

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::rr::{RData, RecordType as WireType};
use tracing::debug;

use crate::domain;
use crate::error::CoreError;
use crate::model::dns::unquote_txt;
use crate::model::{DnsRecord, RecordType};

pub trait DnsLookup: Send + Sync {
    /// Every TXT string at `name`, unquoted. NXDOMAIN/NODATA is empty.
    fn txt(&self, name: &str) -> impl Future<Output = Result<Vec<String>, CoreError>> + Send;

    /// CNAME target at `name`, canonicalized.
    fn cname(&self, name: &str) -> impl Future<Output = Result<Option<String>, CoreError>> + Send;
}

// ── Provider record set ─────────────────────────────────────────────

/// Lookups answered from a fetched record listing.
#[derive(Debug, Clone, Default)]
pub struct RecordSetLookup {
    records: Vec<DnsRecord>,
}

impl RecordSetLookup {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self { records }
    }

    pub fn txt_values(&self, name: &str) -> Vec<String> {
        let name = domain::canonical(name);
        self.records
            .iter()
            .filter(|r| r.record_type == RecordType::Txt && r.name == name)
            .map(|r| unquote_txt(&r.content))
            .collect()
    }

    pub fn cname_target(&self, name: &str) -> Option<String> {
        let name = domain::canonical(name);
        self.records
            .iter()
            .find(|r| r.record_type == RecordType::Cname && r.name == name)
            .map(|r| domain::canonical(&r.content))
    }
}

impl DnsLookup for RecordSetLookup {
    async fn txt(&self, name: &str) -> Result<Vec<String>, CoreError> {
        Ok(self.txt_values(name))
    }

    async fn cname(&self, name: &str) -> Result<Option<String>, CoreError> {
        Ok(self.cname_target(name))
    }
}

// ── Live DNS ────────────────────────────────────────────────────────

/// Lookups against recursive resolvers via hickory.
#[derive(Clone)]
pub struct ResolverLookup {
    resolver: TokioAsyncResolver,
}

impl std::fmt::Debug for ResolverLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverLookup").finish_non_exhaustive()
    }
}

impl ResolverLookup {
    /// Resolvers from the host's system configuration.
    pub fn from_system_conf() -> Result<Self, CoreError> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().map_err(|e| CoreError::Config {
            message: format!("cannot read system resolver configuration: {e}"),
        })?;
        Ok(Self { resolver })
    }

    /// Public resolvers, for hosts without a usable system config.
    pub fn public() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::cloudflare(), ResolverOpts::default()),
        }
    }
}

fn is_no_records(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

fn lookup_error(name: &str, err: &ResolveError) -> CoreError {
    CoreError::Lookup {
        name: name.to_owned(),
        message: err.to_string(),
    }
}

impl DnsLookup for ResolverLookup {
    async fn txt(&self, name: &str) -> Result<Vec<String>, CoreError> {
        match self.resolver.txt_lookup(name).await {
            Ok(lookup) => {
                let values: Vec<String> = lookup
                    .iter()
                    .map(|txt| {
                        txt.txt_data()
                            .iter()
                            .map(|part| String::from_utf8_lossy(part).into_owned())
                            .collect::<String>()
                    })
                    .collect();
                debug!(name, count = values.len(), "TXT lookup");
                Ok(values)
            }
            Err(e) if is_no_records(&e) => Ok(Vec::new()),
            Err(e) => Err(lookup_error(name, &e)),
        }
    }

    async fn cname(&self, name: &str) -> Result<Option<String>, CoreError> {
        match self.resolver.lookup(name, WireType::CNAME).await {
            Ok(lookup) => Ok(lookup.iter().find_map(|rdata| match rdata {
                RData::CNAME(target) => Some(domain::canonical(&target.0.to_utf8())),
                _ => None,
            })),
            Err(e) if is_no_records(&e) => Ok(None),
            Err(e) => Err(lookup_error(name, &e)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn records() -> Vec<DnsRecord> {
        vec![
            DnsRecord::new(RecordType::Txt, "example.com", "\"v=spf1 -all\"", 300),
            DnsRecord::new(RecordType::Txt, "example.com", "verify=abc", 300),
            DnsRecord::new(RecordType::Cname, "s1._domainkey.example.com", "S1.Provider.Example.", 300),
        ]
    }

    #[tokio::test]
    async fn record_set_answers_txt() {
        let lookup = RecordSetLookup::new(records());
        let txts = lookup.txt("Example.com.").await.unwrap();
        assert_eq!(txts, vec!["v=spf1 -all", "verify=abc"]);
        assert!(lookup.txt("_dmarc.example.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_set_answers_cname() {
        let lookup = RecordSetLookup::new(records());
        assert_eq!(
            lookup.cname("s1._domainkey.example.com").await.unwrap().as_deref(),
            Some("s1.provider.example")
        );
        assert_eq!(lookup.cname("s2._domainkey.example.com").await.unwrap(), None);
    }
}
