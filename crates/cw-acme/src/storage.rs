use crate::types::{AcmeResult, DomainSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Read-only view over the certbot directory layout.
///
/// Bundles are written by certbot alone; this type only resolves their paths.
pub struct CertStore {
    base_path: PathBuf,
}

impl CertStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the current bundle for a domain set
    pub fn live_dir(&self, domains: &DomainSet) -> PathBuf {
        self.base_path.join("live").join(domains.primary())
    }

    /// Path to the full chain certificate
    pub fn fullchain_path(&self, domains: &DomainSet) -> PathBuf {
        self.live_dir(domains).join("fullchain.pem")
    }

    /// Path to the private key
    pub fn privkey_path(&self, domains: &DomainSet) -> PathBuf {
        self.live_dir(domains).join("privkey.pem")
    }

    /// Check if a previously issued bundle is present
    pub fn bundle_exists(&self, domains: &DomainSet) -> bool {
        self.fullchain_path(domains).exists() && self.privkey_path(domains).exists()
    }
}

/// Create the HTTP-01 webroot if the proxy has not mounted it yet
pub fn prepare_webroot(webroot: &Path) -> AcmeResult<()> {
    fs::create_dir_all(webroot)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn example_set() -> DomainSet {
        DomainSet::new(["example.com", "www.example.com"]).unwrap()
    }

    #[test]
    fn test_paths_keyed_by_primary() {
        let store = CertStore::new("/etc/letsencrypt");
        let set = example_set();
        assert_eq!(
            store.fullchain_path(&set),
            PathBuf::from("/etc/letsencrypt/live/example.com/fullchain.pem")
        );
        assert_eq!(
            store.privkey_path(&set),
            PathBuf::from("/etc/letsencrypt/live/example.com/privkey.pem")
        );
    }

    #[test]
    fn test_bundle_requires_chain_and_key() {
        let dir = tempdir().unwrap();
        let store = CertStore::new(dir.path());
        let set = example_set();
        assert!(!store.bundle_exists(&set));

        fs::create_dir_all(store.live_dir(&set)).unwrap();
        fs::write(store.fullchain_path(&set), "chain").unwrap();
        assert!(!store.bundle_exists(&set));

        fs::write(store.privkey_path(&set), "key").unwrap();
        assert!(store.bundle_exists(&set));
    }

    #[test]
    fn test_prepare_webroot_is_idempotent() {
        let dir = tempdir().unwrap();
        let webroot = dir.path().join("www").join("certbot");
        prepare_webroot(&webroot).unwrap();
        prepare_webroot(&webroot).unwrap();
        assert!(webroot.is_dir());
    }
}
