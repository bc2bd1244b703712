use crate::certbot::Certbot;
use crate::proxy::ProxyReloader;
use crate::runner::CommandRunner;
use crate::types::{AcmeResult, DomainSet};
use tracing::info;

/// Operator-invoked first-time setup.
///
/// Issues every domain set in order and then reloads the running proxy.
/// The first failure aborts: later sets are not requested and the proxy is
/// left untouched.
pub struct Bootstrap<R> {
    certbot: Certbot<R>,
    reloader: ProxyReloader<R>,
    domain_sets: Vec<DomainSet>,
}

impl<R: CommandRunner> Bootstrap<R> {
    pub fn new(
        certbot: Certbot<R>,
        reloader: ProxyReloader<R>,
        domain_sets: Vec<DomainSet>,
    ) -> Self {
        Self {
            certbot,
            reloader,
            domain_sets,
        }
    }

    pub async fn run(&self) -> AcmeResult<()> {
        let total = self.domain_sets.len();

        for (index, domains) in self.domain_sets.iter().enumerate() {
            info!(
                set = index + 1,
                total,
                domains = %domains,
                "Issuing certificate"
            );
            self.certbot.obtain(domains).await?;
            info!(domain = %domains.primary(), "Certificate issued");
        }

        self.reloader.reload().await?;

        info!(certificates = total, "Certificate bootstrap complete");
        Ok(())
    }
}
