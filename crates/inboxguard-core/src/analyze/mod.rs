// ── Pure analyzers ──
//
// SPF lookup accounting, DMARC validation and unsubscribe-header lint.
// No I/O; identical input always yields identical output.

pub mod dmarc;
pub mod headers;
pub mod spf;

pub use headers::{HeaderLint, HeaderStatus};
pub use spf::SpfAnalysis;
