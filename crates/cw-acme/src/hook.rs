use std::path::PathBuf;
use tracing::warn;

/// What certbot reports to a deploy hook after a successful renewal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenewedLineage {
    /// `RENEWED_LINEAGE`, e.g. `/etc/letsencrypt/live/example.com`
    pub lineage: Option<PathBuf>,
    /// `RENEWED_DOMAINS`, space separated
    pub domains: Vec<String>,
}

impl RenewedLineage {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lineage = lookup("RENEWED_LINEAGE")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let domains: Vec<String> = lookup("RENEWED_DOMAINS")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Self { lineage, domains }
    }

    /// Tell the operator a reload is needed. Nothing is reloaded from here.
    pub fn announce(&self) {
        let lineage = self
            .lineage
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        warn!(
            lineage = %lineage,
            domains = %self.domains.join(" "),
            "Certificate renewed. Reload the reverse proxy manually to serve it"
        );
    }
}
