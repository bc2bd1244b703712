use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default certbot configuration directory
pub const DEFAULT_CONFIG_DIR: &str = "/etc/letsencrypt";

/// Configuration for the certbot-driven certificate lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcmeConfig {
    /// ACME client executable
    pub certbot_bin: String,
    /// Certbot configuration directory (holds `live/<primary>/`)
    pub config_dir: PathBuf,
    /// Webroot shared with the reverse proxy for HTTP-01 challenges
    pub webroot: PathBuf,
    /// Account email for Let's Encrypt
    pub account_email: String,
    /// Use the Let's Encrypt staging endpoint
    pub staging: bool,
    /// Command certbot runs after a successful renewal
    pub deploy_hook: String,
}

impl Default for AcmeConfig {
    fn default() -> Self {
        Self {
            certbot_bin: "certbot".to_string(),
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            webroot: PathBuf::from("/var/www/certbot"),
            account_email: String::new(),
            staging: false,
            deploy_hook: "certwarden deploy-hook".to_string(),
        }
    }
}

/// Hostnames covered by one certificate bundle, primary name first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct DomainSet {
    domains: Vec<String>,
}

impl DomainSet {
    /// Build a domain set, normalising names to lowercase and dropping duplicates
    pub fn new<I, S>(domains: I) -> AcmeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for domain in domains {
            let domain = domain.as_ref().trim().trim_end_matches('.').to_ascii_lowercase();
            validate_hostname(&domain)?;
            if !normalized.contains(&domain) {
                normalized.push(domain);
            }
        }

        if normalized.is_empty() {
            return Err(AcmeError::EmptyDomainSet);
        }

        Ok(Self {
            domains: normalized,
        })
    }

    /// The name the certificate bundle is stored under
    pub fn primary(&self) -> &str {
        &self.domains[0]
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl fmt::Display for DomainSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.domains.join(", "))
    }
}

impl TryFrom<Vec<String>> for DomainSet {
    type Error = AcmeError;

    fn try_from(domains: Vec<String>) -> AcmeResult<Self> {
        Self::new(domains)
    }
}

impl From<DomainSet> for Vec<String> {
    fn from(set: DomainSet) -> Self {
        set.domains
    }
}

fn validate_hostname(domain: &str) -> AcmeResult<()> {
    let invalid = |reason: &str| AcmeError::InvalidDomain(format!("{domain:?}: {reason}"));

    if domain.is_empty() {
        return Err(invalid("empty name"));
    }
    if domain.len() > 253 {
        return Err(invalid("longer than 253 characters"));
    }
    if domain.contains('*') {
        return Err(invalid("wildcards cannot be validated over HTTP-01"));
    }

    for label in domain.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err(invalid("label must be 1 to 63 characters"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid("label cannot start or end with '-'"));
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(invalid("only letters, digits and '-' are allowed"));
        }
    }

    Ok(())
}

#[derive(Error, Debug)]
pub enum AcmeError {
    #[error("Invalid domain {0}")]
    InvalidDomain(String),

    #[error("Domain set is empty")]
    EmptyDomainSet,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to launch {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Certificate acquisition failed for {domain} (exit code {code:?})")]
    AcquisitionFailed { domain: String, code: Option<i32> },

    #[error("Proxy reload failed (exit code {code:?})")]
    ReloadFailed { code: Option<i32> },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type AcmeResult<T> = Result<T, AcmeError>;
