use crate::runner::{CommandRunner, Invocation};
use crate::types::{AcmeError, AcmeResult};
use tracing::info;

/// Issues the live-reload command to the already running reverse proxy
pub struct ProxyReloader<R> {
    runner: R,
    invocation: Invocation,
}

impl<R: CommandRunner> ProxyReloader<R> {
    pub fn new(runner: R, invocation: Invocation) -> Self {
        Self { runner, invocation }
    }

    /// Build from a whitespace-separated command line such as
    /// `docker compose exec nginx nginx -s reload`.
    /// Quoting is not supported, so quoted command lines are rejected.
    pub fn from_command_line(runner: R, command: &str) -> AcmeResult<Self> {
        if command.contains(['"', '\'']) {
            return Err(AcmeError::ConfigError(format!(
                "Proxy reload command cannot contain quotes: {command}"
            )));
        }
        let invocation = Invocation::from_command_line(command)
            .ok_or_else(|| AcmeError::ConfigError("Proxy reload command is empty".into()))?;
        Ok(Self::new(runner, invocation))
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub async fn reload(&self) -> AcmeResult<()> {
        info!(command = %self.invocation, "Reloading reverse proxy");

        let outcome = self
            .runner
            .run(&self.invocation)
            .await
            .map_err(|e| AcmeError::SpawnFailed {
                program: self.invocation.program.clone(),
                source: e,
            })?;

        if !outcome.success() {
            return Err(AcmeError::ReloadFailed {
                code: outcome.code(),
            });
        }

        info!("Reverse proxy reloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ExitOutcome;

    struct FixedExit(Option<i32>);

    impl CommandRunner for FixedExit {
        async fn run(&self, _invocation: &Invocation) -> std::io::Result<ExitOutcome> {
            Ok(ExitOutcome::from_code(self.0))
        }
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(
            ProxyReloader::from_command_line(FixedExit(Some(0)), "  "),
            Err(AcmeError::ConfigError(_))
        ));
    }

    #[test]
    fn test_quoted_command_rejected() {
        for command in [
            r#"sh -c "nginx -t && nginx -s reload""#,
            "sh -c 'nginx -s reload'",
        ] {
            assert!(matches!(
                ProxyReloader::from_command_line(FixedExit(Some(0)), command),
                Err(AcmeError::ConfigError(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_reload_exit_status() {
        let ok = ProxyReloader::from_command_line(FixedExit(Some(0)), "nginx -s reload").unwrap();
        assert_eq!(ok.invocation().program, "nginx");
        assert!(ok.reload().await.is_ok());

        let failed = ProxyReloader::from_command_line(FixedExit(Some(2)), "nginx -s reload").unwrap();
        assert!(matches!(
            failed.reload().await,
            Err(AcmeError::ReloadFailed { code: Some(2) })
        ));

        let killed = ProxyReloader::from_command_line(FixedExit(None), "nginx -s reload").unwrap();
        assert!(killed.reload().await.is_err());
    }
}
