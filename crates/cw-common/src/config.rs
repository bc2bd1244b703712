use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration principale chargée depuis les variables d'environnement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Ensembles de domaines, un certificat par ensemble (domaine principal en tête)
    pub cert_domains: Vec<Vec<String>>,
    /// Email pour le compte ACME
    pub acme_email: Option<String>,
    /// Utiliser l'environnement de staging Let's Encrypt
    pub acme_staging: bool,
    /// Exécutable du client ACME
    pub certbot_bin: String,
    /// Répertoire de configuration certbot (contient live/<domaine>/)
    pub letsencrypt_dir: PathBuf,
    /// Webroot partagé avec le reverse proxy pour les challenges HTTP-01
    pub acme_webroot: PathBuf,
    /// Délai avant la première action, le temps que le proxy démarre
    pub startup_delay_secs: u64,
    /// Intervalle entre deux `certbot renew`
    pub renew_interval_secs: u64,
    /// Commande de rechargement du proxy (uniquement pour `init`).
    /// Découpée sur les espaces, sans guillemets : utiliser un script pour une commande composée.
    pub proxy_reload_command: String,
    /// Deploy hook passé à `certbot renew`
    pub deploy_hook: String,
    /// Logs au format JSON
    pub log_json: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            cert_domains: Vec::new(),
            acme_email: None,
            acme_staging: false,
            certbot_bin: "certbot".to_string(),
            letsencrypt_dir: PathBuf::from("/etc/letsencrypt"),
            acme_webroot: PathBuf::from("/var/www/certbot"),
            startup_delay_secs: 15,
            renew_interval_secs: 12 * 3600,
            proxy_reload_command: "docker compose exec nginx nginx -s reload".to_string(),
            deploy_hook: "certwarden deploy-hook".to_string(),
            log_json: false,
        }
    }
}

impl EnvConfig {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construit la configuration à partir d'une fonction de lecture des variables.
    /// Une valeur invalide laisse la valeur par défaut en place.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("CERT_DOMAINS") {
            config.cert_domains = parse_domain_sets(&v);
        }
        if let Some(v) = lookup("ACME_EMAIL") {
            let v = v.trim();
            if !v.is_empty() {
                config.acme_email = Some(v.to_string());
            }
        }
        if let Some(v) = lookup("ACME_STAGING") {
            config.acme_staging = parse_bool(&v);
        }
        if let Some(v) = lookup("CERTBOT_BIN") {
            config.certbot_bin = v;
        }
        if let Some(v) = lookup("LETSENCRYPT_DIR") {
            config.letsencrypt_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("ACME_WEBROOT") {
            config.acme_webroot = PathBuf::from(v);
        }
        if let Some(v) = lookup("STARTUP_DELAY_SECS") {
            if let Ok(secs) = v.trim().parse() {
                config.startup_delay_secs = secs;
            }
        }
        if let Some(v) = lookup("RENEW_INTERVAL_SECS") {
            if let Ok(secs) = v.trim().parse() {
                config.renew_interval_secs = secs;
            }
        }
        if let Some(v) = lookup("PROXY_RELOAD_COMMAND") {
            config.proxy_reload_command = v;
        }
        if let Some(v) = lookup("DEPLOY_HOOK") {
            config.deploy_hook = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            config.log_json = v.trim().eq_ignore_ascii_case("json");
        }

        config
    }

    /// Charge le fichier .env puis les variables d'environnement.
    /// Un fichier explicite illisible est une erreur, les emplacements par défaut sont optionnels.
    pub fn load(env_file: Option<&Path>) -> AppResult<Self> {
        if let Some(path) = env_file {
            let content = std::fs::read_to_string(path)?;
            apply_dotenv(&content);
        } else {
            let candidates = [
                PathBuf::from("/etc/certwarden/.env"),
                PathBuf::from(".env"),
            ];
            for candidate in &candidates {
                if candidate.exists() {
                    let content = std::fs::read_to_string(candidate)?;
                    apply_dotenv(&content);
                    break;
                }
            }
        }

        Ok(Self::from_env())
    }

    /// Vérifie les champs requis par `run` et `init`
    pub fn validate(&self) -> AppResult<()> {
        if self.acme_email.is_none() {
            return Err(AppError::Config("ACME_EMAIL is not set".into()));
        }
        if self.cert_domains.is_empty() {
            return Err(AppError::Config("CERT_DOMAINS is empty".into()));
        }
        if self.certbot_bin.trim().is_empty() {
            return Err(AppError::Config("CERTBOT_BIN is empty".into()));
        }
        if self.renew_interval_secs == 0 {
            return Err(AppError::Config(
                "RENEW_INTERVAL_SECS must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }

    pub fn renew_interval(&self) -> Duration {
        Duration::from_secs(self.renew_interval_secs)
    }
}

/// Découpe `CERT_DOMAINS` : `;` sépare les ensembles, `,` ou espace sépare les noms
pub fn parse_domain_sets(value: &str) -> Vec<Vec<String>> {
    value
        .split(';')
        .map(|set| {
            set.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|set| !set.is_empty())
        .collect()
}

fn parse_bool(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.to_lowercase() == "true"
}

/// Parse un fichier .env basique (KEY=VALUE par ligne)
fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let value = value.trim().trim_matches('"').trim_matches('\'');
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs
}

fn apply_dotenv(content: &str) {
    for (key, value) in parse_dotenv(content) {
        if std::env::var(&key).is_err() {
            // SAFETY: called before spawning any threads (single-threaded init)
            unsafe { std::env::set_var(&key, &value) };
        }
    }
}
