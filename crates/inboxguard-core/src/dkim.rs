// ── DKIM selector verification ──

use crate::config::DkimSelector;
use crate::domain;
use crate::error::CoreError;
use crate::lookup::DnsLookup;
use crate::model::DkimPostcheck;

/// Resolve each selector's CNAME and compare it with the configured target.
pub async fn postcheck<L: DnsLookup>(
    lookup: &L,
    zone_root: &str,
    selectors: &[DkimSelector],
) -> Result<Vec<DkimPostcheck>, CoreError> {
    let checks = selectors.iter().map(|sel| async move {
        let name = domain::qualify(&sel.host, zone_root);
        let resolves_to = lookup.cname(&name).await?;
        let ok = resolves_to.as_deref() == Some(domain::canonical(&sel.target).as_str());
        Ok::<_, CoreError>(DkimPostcheck {
            name,
            resolves_to,
            ok,
        })
    });
    futures_util::future::try_join_all(checks).await
}
