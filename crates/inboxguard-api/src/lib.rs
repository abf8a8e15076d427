// inboxguard-api: resilient async clients for the DNS provider and metrics APIs

pub mod auth;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod transport;

pub use auth::{Access, CredentialHeader};
pub use error::Error;
pub use metrics::MetricsClient;
pub use metrics::types::MetricRow;
pub use provider::DnsProviderClient;
pub use provider::types::{RecordBody, RecordResponse};
pub use transport::{ClientConfig, ResilientClient, RetryPolicy, TlsMode};
