use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::auth::{NetStorageSigner, Signer};
use crate::body::UploadSource;
use crate::decoder::{PayloadDecoder, XmlPayloadDecoder};
use crate::dispatcher::Dispatcher;
use crate::error::NetStorageError;
use crate::request::{Action, ActionRequest};
use crate::response::ActionOutcome;

/// Configuration for [`NetStorageClient`]
#[derive(Clone)]
pub struct NetStorageConfig {
    pub hostname: String,
    pub key_name: String,
    pub key: SecretString,
    pub ssl: bool,
    /// Whole-request timeout; `None` leaves the transport defaults in place
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for NetStorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetStorageConfig")
            .field("hostname", &self.hostname)
            .field("key_name", &self.key_name)
            .field("key", &"[REDACTED]")
            .field("ssl", &self.ssl)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl NetStorageConfig {
    /// Create configuration for a NetStorage upload account
    pub fn new(
        hostname: impl Into<String>,
        key_name: impl Into<String>,
        key: impl Into<String>,
        ssl: bool,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            key_name: key_name.into(),
            key: SecretString::from(key.into()),
            ssl,
            timeout: None,
        }
    }

    /// Set a timeout applied to every request
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Create configuration from environment variables
    ///
    /// Expects (all required):
    /// - `NETSTORAGE_HOSTNAME`: API hostname, e.g. `example-nsu.akamaihd.net`
    /// - `NETSTORAGE_KEY_NAME`: upload account key name
    /// - `NETSTORAGE_KEY`: upload account key
    /// - `NETSTORAGE_SSL`: `true` for HTTPS, `false` for plain HTTP
    ///
    /// # Errors
    /// Returns [`NetStorageError::Config`] when a variable is missing or invalid.
    pub fn from_env() -> Result<Self, NetStorageError> {
        let var = |name: &str| {
            std::env::var(name).map_err(|_| NetStorageError::Config(format!("{name} not set")))
        };
        let hostname = var("NETSTORAGE_HOSTNAME")?;
        let key_name = var("NETSTORAGE_KEY_NAME")?;
        let key = var("NETSTORAGE_KEY")?;
        let ssl = var("NETSTORAGE_SSL")?.trim().parse::<bool>().map_err(|_| {
            NetStorageError::Config("NETSTORAGE_SSL must be 'true' or 'false'".into())
        })?;

        Ok(Self::new(hostname, key_name, key, ssl))
    }

    /// Check that every mandatory option is present
    ///
    /// # Errors
    /// Returns [`NetStorageError::Config`] naming the first missing option.
    pub fn validate(&self) -> Result<(), NetStorageError> {
        use secrecy::ExposeSecret;

        if self.hostname.trim().is_empty() {
            return Err(NetStorageError::Config("hostname is required".into()));
        }
        if self.key_name.trim().is_empty() {
            return Err(NetStorageError::Config("key_name is required".into()));
        }
        if self.key.expose_secret().is_empty() {
            return Err(NetStorageError::Config("key is required".into()));
        }
        Ok(())
    }
}

/// Client for one NetStorage upload account.
///
/// Holds only immutable configuration and a pooled HTTP client, so it is cheap
/// to clone and safe to share between tasks.
#[derive(Clone)]
pub struct NetStorageClient {
    inner: Arc<Dispatcher>,
}

impl std::fmt::Debug for NetStorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetStorageClient").finish_non_exhaustive()
    }
}

impl NetStorageClient {
    /// Create client from configuration, signing with [`NetStorageSigner`]
    /// and decoding with [`XmlPayloadDecoder`]
    ///
    /// # Errors
    /// Returns [`NetStorageError::Config`] for incomplete configuration and
    /// [`NetStorageError::BuildError`] if the HTTP client cannot be built.
    pub fn from_config(config: NetStorageConfig) -> Result<Self, NetStorageError> {
        NetStorageClientBuilder::new(config).build()
    }

    /// Start a builder that allows replacing the signer or decoder
    pub fn builder(config: NetStorageConfig) -> NetStorageClientBuilder {
        NetStorageClientBuilder::new(config)
    }

    /// Execute a prebuilt action request
    ///
    /// # Errors
    /// Any failure resolves as a single [`NetStorageError`].
    pub async fn execute(&self, request: ActionRequest) -> Result<ActionOutcome, NetStorageError> {
        self.inner.execute(request).await
    }

    /// List a directory
    ///
    /// # Errors
    /// See [`NetStorageClient::execute`].
    pub async fn dir(&self, path: &str) -> Result<ActionOutcome, NetStorageError> {
        self.run(Action::Dir, path).await
    }

    /// Recursively list files below `path`
    ///
    /// # Errors
    /// See [`NetStorageClient::execute`].
    pub async fn list(
        &self,
        path: &str,
        max_entries: Option<u32>,
        end: Option<String>,
    ) -> Result<ActionOutcome, NetStorageError> {
        self.run(Action::List { max_entries, end }, path).await
    }

    /// Disk usage of a directory
    ///
    /// # Errors
    /// See [`NetStorageClient::execute`].
    pub async fn du(&self, path: &str) -> Result<ActionOutcome, NetStorageError> {
        self.run(Action::Du, path).await
    }

    /// # Errors
    /// See [`NetStorageClient::execute`].
    pub async fn stat(&self, path: &str) -> Result<ActionOutcome, NetStorageError> {
        self.run(Action::Stat, path).await
    }

    /// # Errors
    /// See [`NetStorageClient::execute`].
    pub async fn mkdir(&self, path: &str) -> Result<ActionOutcome, NetStorageError> {
        self.run(Action::Mkdir, path).await
    }

    /// # Errors
    /// See [`NetStorageClient::execute`].
    pub async fn rmdir(&self, path: &str) -> Result<ActionOutcome, NetStorageError> {
        self.run(Action::Rmdir, path).await
    }

    /// Set the modification time (unix seconds) of a file
    ///
    /// # Errors
    /// See [`NetStorageClient::execute`].
    pub async fn mtime(&self, path: &str, mtime: i64) -> Result<ActionOutcome, NetStorageError> {
        self.run(Action::Mtime { mtime }, path).await
    }

    /// # Errors
    /// See [`NetStorageClient::execute`].
    pub async fn delete(&self, path: &str) -> Result<ActionOutcome, NetStorageError> {
        self.run(Action::Delete, path).await
    }

    /// Delete a directory and everything below it
    ///
    /// # Errors
    /// See [`NetStorageClient::execute`].
    pub async fn quick_delete(&self, path: &str) -> Result<ActionOutcome, NetStorageError> {
        self.run(Action::QuickDelete, path).await
    }

    /// # Errors
    /// See [`NetStorageClient::execute`].
    pub async fn rename(
        &self,
        target: &str,
        destination: &str,
    ) -> Result<ActionOutcome, NetStorageError> {
        let action = Action::Rename {
            destination: destination.to_owned(),
        };
        self.run(action, target).await
    }

    /// Create a symlink at `path` pointing to `target`
    ///
    /// # Errors
    /// See [`NetStorageClient::execute`].
    pub async fn symlink(&self, target: &str, path: &str) -> Result<ActionOutcome, NetStorageError> {
        let action = Action::Symlink {
            target: target.to_owned(),
        };
        self.run(action, path).await
    }

    /// Upload a local file
    ///
    /// A `remote_path` ending in `/` receives the local file name.
    ///
    /// # Errors
    /// Returns [`NetStorageError::Validation`] when `local` is a directory,
    /// otherwise see [`NetStorageClient::execute`].
    pub async fn upload(
        &self,
        local: impl Into<PathBuf>,
        remote_path: &str,
    ) -> Result<ActionOutcome, NetStorageError> {
        let local = local.into();
        if tokio::fs::metadata(&local)
            .await
            .is_ok_and(|meta| meta.is_dir())
        {
            return Err(NetStorageError::Validation(format!(
                "'{}' is a directory, not a file",
                local.display()
            )));
        }
        self.upload_source(UploadSource::Local(local), remote_path)
            .await
    }

    /// Upload by streaming the body of `source_url`
    ///
    /// # Errors
    /// Returns [`NetStorageError::RemoteStatus`] for any status other than 200,
    /// otherwise see [`NetStorageClient::execute`].
    pub async fn upload_from_url(
        &self,
        source_url: &str,
        remote_path: &str,
    ) -> Result<ActionOutcome, NetStorageError> {
        self.upload_source(UploadSource::remote(source_url), remote_path)
            .await
    }

    /// Download a file; an empty `destination` writes into the working directory
    ///
    /// # Errors
    /// Returns [`NetStorageError::Validation`] for paths ending in `/`,
    /// otherwise see [`NetStorageClient::execute`].
    pub async fn download(
        &self,
        path: &str,
        destination: impl Into<PathBuf>,
    ) -> Result<ActionOutcome, NetStorageError> {
        let action = Action::Download {
            destination: destination.into(),
        };
        self.run(action, path).await
    }

    async fn upload_source(
        &self,
        source: UploadSource,
        remote_path: &str,
    ) -> Result<ActionOutcome, NetStorageError> {
        let remote_path = match source.file_name() {
            Some(name) if remote_path.ends_with('/') => format!("{remote_path}{name}"),
            _ => remote_path.to_owned(),
        };
        self.run(Action::Upload { source }, &remote_path).await
    }

    async fn run(&self, action: Action, path: &str) -> Result<ActionOutcome, NetStorageError> {
        self.execute(ActionRequest::new(action, path)).await
    }
}

/// Builder for [`NetStorageClient`] with replaceable collaborators
pub struct NetStorageClientBuilder {
    config: NetStorageConfig,
    signer: Option<Arc<dyn Signer>>,
    decoder: Option<Arc<dyn PayloadDecoder>>,
}

impl NetStorageClientBuilder {
    fn new(config: NetStorageConfig) -> Self {
        Self {
            config,
            signer: None,
            decoder: None,
        }
    }

    /// Use a custom signer instead of [`NetStorageSigner`]
    #[must_use]
    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Use a custom payload decoder instead of [`XmlPayloadDecoder`]
    #[must_use]
    pub fn decoder(mut self, decoder: Arc<dyn PayloadDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Build the client
    ///
    /// # Errors
    /// See [`NetStorageClient::from_config`].
    pub fn build(self) -> Result<NetStorageClient, NetStorageError> {
        self.config.validate()?;
        let NetStorageConfig {
            hostname,
            key_name,
            key,
            ssl,
            timeout,
        } = self.config;

        let mut http_builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            http_builder = http_builder.timeout(timeout);
        }
        let http_client = http_builder
            .build()
            .map_err(|e| NetStorageError::BuildError(e.to_string()))?;

        let mut dispatcher = Dispatcher::new(
            http_client,
            hostname,
            ssl,
            Arc::new(NetStorageSigner::new(key_name, key)),
            Arc::new(XmlPayloadDecoder),
        );
        if let Some(signer) = self.signer {
            dispatcher = dispatcher.with_signer(signer);
        }
        if let Some(decoder) = self.decoder {
            dispatcher = dispatcher.with_decoder(decoder);
        }

        Ok(NetStorageClient {
            inner: Arc::new(dispatcher),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn config() -> NetStorageConfig {
        NetStorageConfig::new("example-nsu.akamaihd.net", "upload-user", "secret", true)
    }

    #[test]
    fn test_config_new() {
        let config = config();
        assert_eq!(config.hostname, "example-nsu.akamaihd.net");
        assert!(config.ssl);
        assert!(config.timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_with_timeout() {
        let config = config().with_timeout(Duration::from_secs(60));
        assert_eq!(config.timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let key = "k3y-Zq81-do-not-print";
        let config = NetStorageConfig::new("example-nsu.akamaihd.net", "upload-user", key, true);

        for rendered in [format!("{config:?}"), format!("{config:#?}")] {
            assert!(!rendered.contains(key));
            assert!(!rendered.contains("Zq81"));
            assert!(rendered.contains("[REDACTED]"));
        }
    }

    #[test]
    fn test_missing_options_rejected() {
        for config in [
            NetStorageConfig::new("", "user", "key", false),
            NetStorageConfig::new("host", "", "key", false),
            NetStorageConfig::new("host", "user", "", false),
        ] {
            assert!(matches!(
                NetStorageClient::from_config(config),
                Err(NetStorageError::Config(_))
            ));
        }
    }

    #[test]
    fn test_client_creation() {
        let client = NetStorageClient::from_config(config());
        assert!(client.is_ok());
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("NETSTORAGE_HOSTNAME", Some("env-nsu.akamaihd.net")),
                ("NETSTORAGE_KEY_NAME", Some("env-user")),
                ("NETSTORAGE_KEY", Some("env-key")),
                ("NETSTORAGE_SSL", Some("false")),
            ],
            || {
                let config = NetStorageConfig::from_env().unwrap();
                assert_eq!(config.hostname, "env-nsu.akamaihd.net");
                assert_eq!(config.key_name, "env-user");
                assert!(!config.ssl);
            },
        );
    }

    #[test]
    fn test_from_env_requires_every_variable() {
        temp_env::with_vars(
            [
                ("NETSTORAGE_HOSTNAME", Some("env-nsu.akamaihd.net")),
                ("NETSTORAGE_KEY_NAME", Some("env-user")),
                ("NETSTORAGE_KEY", None),
                ("NETSTORAGE_SSL", Some("true")),
            ],
            || {
                let err = NetStorageConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("NETSTORAGE_KEY"));
            },
        );
    }

    #[test]
    fn test_from_env_rejects_bad_ssl_flag() {
        temp_env::with_vars(
            [
                ("NETSTORAGE_HOSTNAME", Some("h")),
                ("NETSTORAGE_KEY_NAME", Some("u")),
                ("NETSTORAGE_KEY", Some("k")),
                ("NETSTORAGE_SSL", Some("yes")),
            ],
            || {
                assert!(matches!(
                    NetStorageConfig::from_env(),
                    Err(NetStorageError::Config(_))
                ));
            },
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_rejected_download_is_logged() {
        let client = NetStorageClient::from_config(config()).unwrap();

        let err = client.download("/dir/", "").await.unwrap_err();

        assert!(matches!(err, NetStorageError::Validation(_)));
        assert!(logs_contain("rejected before sending"));
    }
}
