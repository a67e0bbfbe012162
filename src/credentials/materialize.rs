use super::{CredentialError, FileTokenStore};
use crate::config::CredentialsConfig;
use base64::Engine;
use std::path::{Path, PathBuf};

pub const TOKEN_FILE_NAME: &str = "token.json";
pub const CLIENT_SECRET_FILE_NAME: &str = "client_secret.json";

/// Writes environment-supplied credential material to disk for one run.
pub struct CredentialMaterializer;

impl CredentialMaterializer {
    /// Decode and write whatever `config` carries into `dir`.
    ///
    /// Nothing is written for absent inputs. The returned guard removes every
    /// file written here when it drops.
    pub fn materialize(
        config: &CredentialsConfig,
        dir: &Path,
    ) -> Result<MaterializedCredentials, CredentialError> {
        let mut guard = MaterializedCredentials {
            dir: dir.to_path_buf(),
            token_uri: config.token_uri.clone(),
            created: Vec::new(),
        };

        if config.token_b64.is_none() && config.client_secret_json.is_none() {
            return Ok(guard);
        }

        std::fs::create_dir_all(dir)
            .map_err(|e| CredentialError::Materialize(format!("{}: {}", dir.display(), e)))?;

        if let Some(encoded) = &config.token_b64 {
            let token = base64::engine::general_purpose::STANDARD
                .decode(encoded.trim().as_bytes())
                .map_err(|e| CredentialError::Materialize(format!("token is not base64: {}", e)))?;
            guard.write(TOKEN_FILE_NAME, &token)?;
        }

        if let Some(json) = &config.client_secret_json {
            guard.write(CLIENT_SECRET_FILE_NAME, json.as_bytes())?;
        }

        tracing::debug!(
            "Materialized {} credential file(s) in {:?}",
            guard.created.len(),
            dir
        );

        Ok(guard)
    }
}

/// Credential files on disk for the lifetime of this value.
#[derive(Debug)]
pub struct MaterializedCredentials {
    dir: PathBuf,
    token_uri: Option<String>,
    created: Vec<PathBuf>,
}

impl MaterializedCredentials {
    fn write(&mut self, name: &str, contents: &[u8]) -> Result<(), CredentialError> {
        let path = self.dir.join(name);
        write_private(&path, contents)
            .map_err(|e| CredentialError::Materialize(format!("{}: {}", path.display(), e)))?;
        self.created.push(path);
        Ok(())
    }

    pub fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE_NAME)
    }

    pub fn client_secret_path(&self) -> PathBuf {
        self.dir.join(CLIENT_SECRET_FILE_NAME)
    }

    /// Files this guard will remove.
    pub fn created(&self) -> &[PathBuf] {
        &self.created
    }

    /// Token store over the materialized files.
    pub fn token_store(&self) -> FileTokenStore {
        let mut store = FileTokenStore::new(self.token_path());
        let secret = self.client_secret_path();
        if secret.is_file() {
            store = store.with_client_secret(secret);
        }
        if let Some(uri) = &self.token_uri {
            store = store.with_token_uri(uri.clone());
        }
        store
    }
}

impl Drop for MaterializedCredentials {
    fn drop(&mut self) {
        for path in &self.created {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::debug!("Removed credential file {:?}", path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to remove credential file {:?}: {}", path, e),
            }
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::TokenStore;
    use assert_matches::assert_matches;

    fn config(token: Option<&str>, secret: Option<&str>) -> CredentialsConfig {
        CredentialsConfig {
            token_b64: token.map(|t| base64::engine::general_purpose::STANDARD.encode(t)),
            client_secret_json: secret.map(str::to_string),
            token_uri: None,
        }
    }

    #[test]
    fn test_nothing_to_materialize() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        let guard = CredentialMaterializer::materialize(&config(None, None), &out).unwrap();
        assert!(guard.created().is_empty());
        assert!(!out.exists());
    }

    #[test]
    fn test_drop_removes_created_files() {
        let dir = tempfile::tempdir().unwrap();
        let other = dir.path().join("daily.mp4");
        std::fs::write(&other, b"video").unwrap();

        let guard = CredentialMaterializer::materialize(
            &config(Some(r#"{"token": "a"}"#), Some(r#"{"installed": {}}"#)),
            dir.path(),
        )
        .unwrap();

        let token_path = guard.token_path();
        let secret_path = guard.client_secret_path();
        assert_eq!(std::fs::read_to_string(&token_path).unwrap(), r#"{"token": "a"}"#);
        assert!(secret_path.is_file());
        assert_eq!(guard.created().len(), 2);

        drop(guard);
        assert!(!token_path.exists());
        assert!(!secret_path.exists());
        assert!(other.exists());
    }

    #[test]
    fn test_invalid_base64() {
        let dir = tempfile::tempdir().unwrap();
        let config = CredentialsConfig {
            token_b64: Some("!!not base64!!".to_string()),
            ..CredentialsConfig::default()
        };
        assert_matches!(
            CredentialMaterializer::materialize(&config, dir.path()),
            Err(CredentialError::Materialize(_))
        );
        assert!(!dir.path().join(TOKEN_FILE_NAME).exists());
    }

    #[test]
    fn test_partial_write_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(CLIENT_SECRET_FILE_NAME)).unwrap();

        let result = CredentialMaterializer::materialize(
            &config(Some(r#"{"token": "a"}"#), Some(r#"{"installed": {}}"#)),
            dir.path(),
        );

        assert_matches!(result, Err(CredentialError::Materialize(_)));
        assert!(!dir.path().join(TOKEN_FILE_NAME).exists());
    }

    #[test]
    fn test_cleanup_on_early_return() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join(TOKEN_FILE_NAME);

        fn run(dir: &Path) -> Result<(), CredentialError> {
            let _guard = CredentialMaterializer::materialize(
                &config(Some(r#"{"token": "a"}"#), None),
                dir,
            )?;
            Err(CredentialError::Missing)
        }

        assert!(run(dir.path()).is_err());
        assert!(!token_path.exists());
    }

    #[tokio::test]
    async fn test_token_store_reads_materialized_token() {
        let dir = tempfile::tempdir().unwrap();
        let guard = CredentialMaterializer::materialize(
            &config(Some(r#"{"token": "abc", "refresh_token": "r"}"#), None),
            dir.path(),
        )
        .unwrap();

        let token = guard.token_store().load().await.unwrap().unwrap();
        assert_eq!(token.access_token, "abc");
    }
}
