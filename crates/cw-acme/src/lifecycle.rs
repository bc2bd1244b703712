//! Long-running certificate lifecycle: grace period, first issuance, then
//! a fixed-interval `certbot renew` loop until cancelled.
//!
//! This variant never reloads the reverse proxy. After a first issuance or a
//! renewal the operator is told to reload it.

use crate::certbot::Certbot;
use crate::runner::CommandRunner;
use crate::storage::{self, CertStore};
use crate::types::DomainSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Delay before the first action, so the proxy serves the challenge path
pub const STARTUP_GRACE: Duration = Duration::from_secs(15);

/// Interval between two `certbot renew` runs
pub const RENEW_INTERVAL: Duration = Duration::from_secs(12 * 3600);

/// Result of the startup check for one domain set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupOutcome {
    /// A bundle was already on disk, certbot was not invoked
    AlreadyIssued,
    /// certbot issued a new bundle
    Issued,
    /// certbot failed; the renewal loop will keep going
    Failed,
}

pub struct CertificateLifecycle<R> {
    certbot: Certbot<R>,
    store: CertStore,
    domain_sets: Vec<DomainSet>,
    startup_grace: Duration,
    renew_interval: Duration,
}

impl<R: CommandRunner> CertificateLifecycle<R> {
    pub fn new(certbot: Certbot<R>, domain_sets: Vec<DomainSet>) -> Self {
        let store = CertStore::new(&certbot.config().config_dir);
        Self {
            certbot,
            store,
            domain_sets,
            startup_grace: STARTUP_GRACE,
            renew_interval: RENEW_INTERVAL,
        }
    }

    pub fn with_startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }

    pub fn with_renew_interval(mut self, interval: Duration) -> Self {
        self.renew_interval = interval;
        self
    }

    /// Run until `cancel` fires. Cancellation is observed while sleeping;
    /// a certbot run in progress is always awaited.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            domain_sets = self.domain_sets.len(),
            grace_secs = self.startup_grace.as_secs(),
            renew_interval_hours = self.renew_interval.as_secs() / 3600,
            "Starting certificate lifecycle"
        );

        if !sleep_or_cancel(self.startup_grace, &cancel).await {
            info!("Certificate lifecycle cancelled during startup grace");
            return;
        }

        self.ensure_certificates().await;

        loop {
            if let Some(next_run) = chrono::Duration::from_std(self.renew_interval)
                .ok()
                .and_then(|d| chrono::Utc::now().checked_add_signed(d))
            {
                info!(next_run = %next_run.to_rfc3339(), "Next renewal check scheduled");
            }

            if !sleep_or_cancel(self.renew_interval, &cancel).await {
                info!("Certificate renewal loop stopped");
                return;
            }

            self.certbot.renew().await;
        }
    }

    /// Issue a bundle for every domain set that has none on disk.
    /// Failures are logged and never stop the caller.
    pub async fn ensure_certificates(&self) -> Vec<StartupOutcome> {
        if let Err(e) = storage::prepare_webroot(&self.certbot.config().webroot) {
            warn!(
                webroot = %self.certbot.config().webroot.display(),
                error = %e,
                "Failed to create ACME webroot"
            );
        }

        let mut outcomes = Vec::with_capacity(self.domain_sets.len());

        for domains in &self.domain_sets {
            if self.store.bundle_exists(domains) {
                info!(
                    domain = %domains.primary(),
                    path = %self.store.live_dir(domains).display(),
                    "Certificate already present, skipping acquisition"
                );
                outcomes.push(StartupOutcome::AlreadyIssued);
                continue;
            }

            match self.certbot.obtain(domains).await {
                Ok(()) => {
                    warn!(
                        domains = %domains,
                        "Certificate obtained. Reload the reverse proxy manually to serve it"
                    );
                    outcomes.push(StartupOutcome::Issued);
                }
                Err(e) => {
                    error!(
                        domains = %domains,
                        error = %e,
                        "Certificate acquisition failed, continuing with renewal loop"
                    );
                    outcomes.push(StartupOutcome::Failed);
                }
            }
        }

        outcomes
    }
}

/// Returns false when cancelled before the delay elapsed
async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
