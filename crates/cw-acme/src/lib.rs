//! Certificate lifecycle management on top of certbot
//!
//! This crate keeps Let's Encrypt certificates issued and renewed with HTTP-01
//! challenges served from a webroot shared with the reverse proxy. The ACME
//! protocol is left to the certbot executable; this crate decides when to run
//! it and with which arguments.

mod bootstrap;
mod certbot;
mod hook;
mod lifecycle;
mod proxy;
pub mod runner;
mod storage;
pub mod types;

pub use bootstrap::Bootstrap;
pub use certbot::Certbot;
pub use hook::RenewedLineage;
pub use lifecycle::{CertificateLifecycle, RENEW_INTERVAL, STARTUP_GRACE, StartupOutcome};
pub use proxy::ProxyReloader;
pub use runner::{CommandRunner, ExitOutcome, Invocation, ProcessRunner};
pub use storage::CertStore;
pub use types::{AcmeConfig, AcmeError, AcmeResult, DomainSet};
