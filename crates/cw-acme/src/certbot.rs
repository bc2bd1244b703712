use crate::runner::{CommandRunner, Invocation};
use crate::types::{AcmeConfig, AcmeError, AcmeResult, DEFAULT_CONFIG_DIR, DomainSet};
use std::path::Path;
use tracing::{debug, error, info};

/// Thin wrapper around the certbot executable.
///
/// ACME protocol work and expiry checks stay inside certbot. This type only
/// decides which arguments to pass.
pub struct Certbot<R> {
    runner: R,
    config: AcmeConfig,
}

impl<R: CommandRunner> Certbot<R> {
    pub fn new(runner: R, config: AcmeConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &AcmeConfig {
        &self.config
    }

    /// `certbot certonly` for one domain set, HTTP-01 through the shared webroot
    pub fn certonly_invocation(&self, domains: &DomainSet) -> Invocation {
        let mut args = vec![
            "certonly".to_string(),
            "--webroot".to_string(),
            "-w".to_string(),
            self.config.webroot.to_string_lossy().into_owned(),
            "--email".to_string(),
            self.config.account_email.clone(),
            "--agree-tos".to_string(),
            "--no-eff-email".to_string(),
        ];
        for domain in domains.domains() {
            args.push("-d".to_string());
            args.push(domain.clone());
        }
        if self.config.staging {
            args.push("--staging".to_string());
        }
        self.push_config_dir(&mut args);

        Invocation::new(self.config.certbot_bin.clone(), args)
    }

    /// `certbot renew`; certbot picks the bundles that are due
    pub fn renew_invocation(&self) -> Invocation {
        let mut args = vec![
            "renew".to_string(),
            "--deploy-hook".to_string(),
            self.config.deploy_hook.clone(),
        ];
        self.push_config_dir(&mut args);

        Invocation::new(self.config.certbot_bin.clone(), args)
    }

    fn push_config_dir(&self, args: &mut Vec<String>) {
        if self.config.config_dir != Path::new(DEFAULT_CONFIG_DIR) {
            args.push("--config-dir".to_string());
            args.push(self.config.config_dir.to_string_lossy().into_owned());
        }
    }

    /// Request a certificate for a domain set. A non-zero exit is an error.
    pub async fn obtain(&self, domains: &DomainSet) -> AcmeResult<()> {
        let invocation = self.certonly_invocation(domains);

        info!(
            domains = %domains,
            staging = self.config.staging,
            "Requesting certificate from Let's Encrypt"
        );

        let outcome = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| AcmeError::SpawnFailed {
                program: invocation.program.clone(),
                source: e,
            })?;

        if outcome.success() {
            Ok(())
        } else {
            Err(AcmeError::AcquisitionFailed {
                domain: domains.primary().to_string(),
                code: outcome.code(),
            })
        }
    }

    /// Run `certbot renew`.
    ///
    /// The exit status is not acted upon: certbot logs its own failures and
    /// the next tick retries. Only a failure to launch certbot is reported.
    pub async fn renew(&self) {
        let invocation = self.renew_invocation();

        info!("Running certificate renewal check");

        match self.runner.run(&invocation).await {
            Ok(outcome) => {
                debug!(code = ?outcome.code(), "certbot renew finished");
            }
            Err(e) => {
                error!(program = %invocation.program, error = %e, "Failed to launch certbot renew");
            }
        }
    }
}
