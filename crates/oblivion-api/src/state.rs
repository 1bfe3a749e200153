//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. The registry does its own locking, so the state is
//! a cheap `Arc` clone per request.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use oblivion_core::Identity;
use oblivion_registry::{
    read_json_lines, AuditSinkError, CredentialRegistry, JsonLinesSink, RegistryConfig,
    RegistryError,
};
use oblivion_zkp::{resolve, VerifierRef, VerifyError};
use thiserror::Error;

/// Default verifier when `PASSPORT_VERIFIER` is unset.
pub const DEFAULT_VERIFIER: &str = "mock:allow";

/// Application configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared bearer secret. If `None`, callers are identified without one.
    pub auth_token: Option<String>,
    /// Identity seeded as the first Admin.
    pub admin: Identity,
    /// Verification backend to start with.
    pub verifier: VerifierRef,
    /// Optional YAML file with [`RegistryConfig`].
    pub registry_config_path: Option<PathBuf>,
    /// Optional JSON-lines audit file. Replayed on start when non-empty.
    pub audit_log_path: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("admin", &self.admin)
            .field("verifier", &self.verifier)
            .field("registry_config_path", &self.registry_config_path)
            .field("audit_log_path", &self.audit_log_path)
            .finish()
    }
}

/// Failure assembling configuration or the registry at startup.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// A required variable is missing or a value is malformed.
    #[error("configuration error: {0}")]
    Config(String),
    /// The registry config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file.
        path: PathBuf,
        /// The cause.
        source: std::io::Error,
    },
    /// The registry config file is not valid YAML.
    #[error("invalid registry config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The configured verifier cannot be constructed.
    #[error("verifier: {0}")]
    Verifier(#[from] VerifyError),
    /// The audit file could not be opened or read back.
    #[error("audit log: {0}")]
    Audit(#[from] AuditSinkError),
    /// The registry refused to start (e.g. corrupt history).
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),
}

impl AppConfig {
    /// Build configuration from process environment variables.
    pub fn from_env() -> Result<Self, BootstrapError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BootstrapError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(p) => p
                .trim()
                .parse()
                .map_err(|e| BootstrapError::Config(format!("PORT: {e}")))?,
            None => 8080,
        };
        let admin = get("PASSPORT_ADMIN")
            .ok_or_else(|| BootstrapError::Config("PASSPORT_ADMIN is required".into()))?;
        let admin = Identity::new(admin.trim())
            .map_err(|e| BootstrapError::Config(format!("PASSPORT_ADMIN: {e}")))?;
        let verifier = get("PASSPORT_VERIFIER")
            .unwrap_or_else(|| DEFAULT_VERIFIER.to_string())
            .parse::<VerifierRef>()?;

        Ok(Self {
            port,
            auth_token: get("AUTH_TOKEN"),
            admin,
            verifier,
            registry_config_path: get("PASSPORT_CONFIG").map(PathBuf::from),
            audit_log_path: get("AUDIT_LOG_PATH").map(PathBuf::from),
        })
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The registry.
    pub registry: Arc<CredentialRegistry>,
    /// Startup configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Wrap an existing registry.
    pub fn new(registry: CredentialRegistry, config: AppConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
        }
    }

    /// Construct the registry described by `config`.
    ///
    /// When the audit file already holds records, the registry is rebuilt
    /// from them and new records are appended to the same file.
    pub fn bootstrap(config: AppConfig) -> Result<Self, BootstrapError> {
        let registry_config = match &config.registry_config_path {
            Some(path) => RegistryConfig::from_yaml(&read_file(path)?)?,
            None => RegistryConfig::default(),
        };
        let gate = resolve(&config.verifier)?;

        let mut builder =
            CredentialRegistry::builder(config.admin.clone(), config.verifier.clone(), gate)
                .config(registry_config);

        if let Some(path) = &config.audit_log_path {
            let history = if path.exists() {
                read_json_lines(path)?
            } else {
                Vec::new()
            };
            if !history.is_empty() {
                tracing::info!(
                    path = %path.display(),
                    records = history.len(),
                    "replaying audit log"
                );
            }
            builder = builder
                .sink(Box::new(JsonLinesSink::open(path)?))
                .history(history);
        }

        let registry = builder.build()?;
        Ok(Self::new(registry, config))
    }
}

fn read_file(path: &Path) -> Result<String, BootstrapError> {
    std::fs::read_to_string(path).map_err(|source| BootstrapError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let cfg = AppConfig::from_lookup(lookup(&[("PASSPORT_ADMIN", "root")])).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.verifier.as_str(), DEFAULT_VERIFIER);
        assert!(cfg.auth_token.is_none());
        assert!(cfg.audit_log_path.is_none());
    }

    #[test]
    fn admin_is_required() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "9000")])).unwrap_err();
        assert!(err.to_string().contains("PASSPORT_ADMIN"));
        let err = AppConfig::from_lookup(lookup(&[("PASSPORT_ADMIN", "   ")])).unwrap_err();
        assert!(matches!(err, BootstrapError::Config(_)));
    }

    #[test]
    fn malformed_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("PASSPORT_ADMIN", "root"), ("PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("PASSPORT_ADMIN", "root"),
            ("AUTH_TOKEN", "hunter2"),
        ]))
        .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("REDACTED"));
    }

    #[test]
    fn bootstrap_rejects_unknown_verifier() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("PASSPORT_ADMIN", "root"),
            ("PASSPORT_VERIFIER", "groth16:remote"),
        ]))
        .unwrap();
        assert!(matches!(
            AppState::bootstrap(cfg),
            Err(BootstrapError::Verifier(_))
        ));
    }

    #[test]
    fn bootstrap_replays_existing_audit_file() {
        let dir = tempfile::tempdir().unwrap();
        let audit = dir.path().join("audit.jsonl");
        let yaml = dir.path().join("registry.yaml");
        std::fs::write(&yaml, "allow_reenrollment: true\n").unwrap();
        let cfg = AppConfig::from_lookup(lookup(&[
            ("PASSPORT_ADMIN", "root"),
            ("AUDIT_LOG_PATH", audit.to_str().unwrap()),
            ("PASSPORT_CONFIG", yaml.to_str().unwrap()),
        ]))
        .unwrap();

        let first = AppState::bootstrap(cfg.clone()).unwrap();
        assert!(first.registry.config().allow_reenrollment);
        let admin = Identity::new("root").unwrap();
        let issuer = Identity::new("issuer").unwrap();
        first
            .registry
            .grant_role(&admin, &issuer, oblivion_core::Role::Issuer)
            .unwrap();
        let head = first.registry.audit_head();
        drop(first);

        let second = AppState::bootstrap(cfg).unwrap();
        assert_eq!(second.registry.audit_head(), head);
        assert!(second
            .registry
            .has_role(&issuer, oblivion_core::Role::Issuer));
    }
}
