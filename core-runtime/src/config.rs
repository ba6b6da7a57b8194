//! # Broker Configuration Module
//!
//! Static, process-wide configuration for the Box token broker.
//!
//! ## Overview
//!
//! Everything the broker needs to know about its own identity and about the
//! frontend's folder/template layout is loaded once at startup into an immutable
//! [`BrokerConfig`]. Handlers only ever read it, so it is shared behind an `Arc`
//! without synchronization.
//!
//! Configuration comes from one of three places:
//!
//! - [`BrokerConfig::from_env`]: environment variables (`BOX_CLIENT_ID`, ...)
//! - [`BrokerConfig::from_file`]: a JSON document
//! - [`BrokerConfig::builder`]: programmatic construction (tests, embedding)
//!
//! [`BrokerConfig::load`] picks the file when `BROKER_CONFIG` names one and
//! falls back to the environment otherwise.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{BoxCredentials, BrokerConfig};
//!
//! let config = BrokerConfig::builder()
//!     .credentials(BoxCredentials::new("client-id", "client-secret", "123456"))
//!     .form_url("https://app.box.com/forms/abc")
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! Every constructor validates before returning, and fails fast with an
//! actionable message:
//!
//! ```should_panic
//! use core_runtime::config::BrokerConfig;
//!
//! // No credentials: this will panic with an actionable error message
//! let config = BrokerConfig::builder()
//!     .build()
//!     .expect("Should fail - missing credentials");
//! ```

use crate::error::{Error, Result};
use crate::logging::redact_if_sensitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default Box content API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.box.com/2.0";

/// Default Box OAuth 2.0 token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://api.box.com/oauth2/token";

/// Environment variable naming a JSON configuration file
pub const CONFIG_FILE_ENV: &str = "BROKER_CONFIG";

/// Application credentials for the client-credentials grant.
///
/// The secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct BoxCredentials {
    /// OAuth client ID (also exposed publicly to the frontend)
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Enterprise the service account acts on behalf of
    pub enterprise_id: String,
}

impl BoxCredentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        enterprise_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            enterprise_id: enterprise_id.into(),
        }
    }
}

impl fmt::Debug for BoxCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxCredentials")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &redact_if_sensitive("client_secret", &self.client_secret),
            )
            .field("enterprise_id", &self.enterprise_id)
            .finish()
    }
}

/// Folder roles the frontend navigates between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderIds {
    pub root: String,
    pub documents: String,
    pub client_portal: String,
    pub forms: String,
}

impl Default for FolderIds {
    fn default() -> Self {
        Self {
            root: "0".to_string(),
            documents: String::new(),
            client_portal: String::new(),
            forms: String::new(),
        }
    }
}

/// Metadata templates, each in `scope.templateKey` form
/// (e.g. `enterprise_123456.wealthDocuments`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataTemplates {
    pub wealth_documents: String,
    pub client_info: String,
}

/// A metadata template reference split into its scope and key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    pub scope: String,
    pub template_key: String,
}

impl TemplateRef {
    /// Split `scope.templateKey` at the first `.`.
    ///
    /// Returns `None` when there is no `.` or either half is empty, which is
    /// how unconfigured placeholders are recognised.
    ///
    /// ```
    /// use core_runtime::config::TemplateRef;
    ///
    /// let t = TemplateRef::parse("enterprise_123.wealthDocuments").unwrap();
    /// assert_eq!(t.scope, "enterprise_123");
    /// assert_eq!(t.template_key, "wealthDocuments");
    /// assert!(TemplateRef::parse("unset").is_none());
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        let (scope, template_key) = value.trim().split_once('.')?;
        if scope.is_empty() || template_key.is_empty() {
            return None;
        }
        Some(Self {
            scope: scope.to_string(),
            template_key: template_key.to_string(),
        })
    }
}

/// Box endpoints. Overridable so tests and proxies can point elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BoxEndpoints {
    pub api_base_url: String,
    pub token_url: String,
}

impl Default for BoxEndpoints {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

/// Where the HTTP server listens and what it serves at `/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory holding `index.html` and the frontend's static assets
    pub static_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            static_dir: PathBuf::from("frontend"),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Feature switches, all off by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Restrict issued tokens to the requested folder and scopes
    pub downscope_tokens: bool,

    /// Reuse the enterprise token until shortly before it expires
    pub cache_tokens: bool,

    /// Write upload metadata to the `wealth_documents` template
    pub apply_upload_metadata: bool,
}

/// Immutable broker configuration.
///
/// Use [`BrokerConfigBuilder`], [`BrokerConfig::from_env`] or
/// [`BrokerConfig::from_file`] to construct instances.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    pub credentials: BoxCredentials,

    #[serde(default)]
    pub folder_ids: FolderIds,

    #[serde(default)]
    pub metadata_templates: MetadataTemplates,

    #[serde(default)]
    pub form_url: String,

    #[serde(default)]
    pub endpoints: BoxEndpoints,

    #[serde(default)]
    pub server: ServerSettings,

    /// Outbound request timeout; `None` inherits the HTTP client's default
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,

    #[serde(default)]
    pub features: FeatureFlags,
}

/// Read-only view of the configuration handed to the frontend.
///
/// The client ID is public (the Box UI Elements need it); the secret and
/// enterprise ID are not included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendConfig {
    pub folder_ids: FolderIds,
    pub metadata_templates: MetadataTemplates,
    pub form_url: String,
    pub client_id: String,
}

impl BrokerConfig {
    /// Creates a new builder for constructing a `BrokerConfig`.
    pub fn builder() -> BrokerConfigBuilder {
        BrokerConfigBuilder::default()
    }

    /// Load from the file named by `BROKER_CONFIG`, or from the environment.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Self::from_env(),
        }
    }

    /// Build from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string());
        let required = |key: &str| {
            var(key).filter(|v| !v.is_empty()).ok_or_else(|| {
                Error::Config(format!(
                    "{} must be provided (environment variable or {} file)",
                    key, CONFIG_FILE_ENV
                ))
            })
        };

        let credentials = BoxCredentials::new(
            required("BOX_CLIENT_ID")?,
            required("BOX_CLIENT_SECRET")?,
            required("BOX_ENTERPRISE_ID")?,
        );

        let defaults = FolderIds::default();
        let folder_ids = FolderIds {
            root: var("BOX_FOLDER_ROOT")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.root),
            documents: var("BOX_FOLDER_DOCUMENTS").unwrap_or_default(),
            client_portal: var("BOX_FOLDER_CLIENT_PORTAL").unwrap_or_default(),
            forms: var("BOX_FOLDER_FORMS").unwrap_or_default(),
        };

        let metadata_templates = MetadataTemplates {
            wealth_documents: var("BOX_TEMPLATE_WEALTH_DOCUMENTS").unwrap_or_default(),
            client_info: var("BOX_TEMPLATE_CLIENT_INFO").unwrap_or_default(),
        };

        let mut endpoints = BoxEndpoints::default();
        if let Some(url) = var("BOX_API_BASE_URL").filter(|v| !v.is_empty()) {
            endpoints.api_base_url = url;
        }
        if let Some(url) = var("BOX_TOKEN_URL").filter(|v| !v.is_empty()) {
            endpoints.token_url = url;
        }

        let mut server = ServerSettings::default();
        if let Some(host) = var("BROKER_HOST").filter(|v| !v.is_empty()) {
            server.host = host;
        }
        if let Some(port) = var("BROKER_PORT").filter(|v| !v.is_empty()) {
            server.port = port.parse().map_err(|_| {
                Error::Config(format!("BROKER_PORT must be a port number, got '{}'", port))
            })?;
        }
        if let Some(dir) = var("BROKER_STATIC_DIR").filter(|v| !v.is_empty()) {
            server.static_dir = PathBuf::from(dir);
        }

        let timeout_var = var("BROKER_HTTP_TIMEOUT_SECS").filter(|v| !v.is_empty());
        let http_timeout_secs = match timeout_var {
            Some(raw) => Some(raw.parse().map_err(|_| {
                Error::Config(format!(
                    "BROKER_HTTP_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?),
            None => None,
        };

        let features = FeatureFlags {
            downscope_tokens: parse_flag(
                "BROKER_DOWNSCOPE_TOKENS",
                var("BROKER_DOWNSCOPE_TOKENS"),
            )?,
            cache_tokens: parse_flag("BROKER_CACHE_TOKENS", var("BROKER_CACHE_TOKENS"))?,
            apply_upload_metadata: parse_flag(
                "BROKER_APPLY_UPLOAD_METADATA",
                var("BROKER_APPLY_UPLOAD_METADATA"),
            )?,
        };

        let config = Self {
            credentials,
            folder_ids,
            metadata_templates,
            form_url: var("BOX_FORM_URL").unwrap_or_default(),
            endpoints,
            server,
            http_timeout_secs,
            features,
        };

        config.validate()?;
        Ok(config)
    }

    /// Build from a JSON document on disk.
    ///
    /// Only `credentials` is required; every other section falls back to the
    /// same defaults as the environment loader.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&raw)
    }

    /// Build from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("Invalid config document: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Credentials are non-empty
    /// - Box endpoints are http(s) URLs
    /// - The outbound timeout, when set, is non-zero
    pub fn validate(&self) -> Result<()> {
        let credentials = &self.credentials;
        for (name, value) in [
            ("client_id", &credentials.client_id),
            ("client_secret", &credentials.client_secret),
            ("enterprise_id", &credentials.enterprise_id),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Box {} cannot be empty. Set BOX_{} or provide it in the config file.",
                    name,
                    name.to_uppercase()
                )));
            }
        }

        for (name, url) in [
            ("api_base_url", &self.endpoints.api_base_url),
            ("token_url", &self.endpoints.token_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(Error::Config(format!(
                    "Box {} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }

        if self.http_timeout_secs == Some(0) {
            return Err(Error::Config(
                "HTTP timeout must be greater than 0 seconds; unset it to disable".to_string(),
            ));
        }

        Ok(())
    }

    /// Outbound request timeout, if one is configured.
    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }

    /// The read-only view served by `GET /api/config`.
    pub fn frontend_config(&self) -> FrontendConfig {
        FrontendConfig {
            folder_ids: self.folder_ids.clone(),
            metadata_templates: self.metadata_templates.clone(),
            form_url: self.form_url.clone(),
            client_id: self.credentials.client_id.clone(),
        }
    }

    /// The template upload metadata is written to, if it is usable.
    pub fn upload_template(&self) -> Option<TemplateRef> {
        TemplateRef::parse(&self.metadata_templates.wealth_documents)
    }
}

fn parse_flag(name: &str, value: Option<String>) -> Result<bool> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(false);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{} must be a boolean (true/false), got '{}'",
            name, value
        ))),
    }
}

/// Builder for constructing [`BrokerConfig`] instances.
///
/// Call [`build()`](BrokerConfigBuilder::build) to validate and create the final
/// config.
#[derive(Default)]
pub struct BrokerConfigBuilder {
    credentials: Option<BoxCredentials>,
    folder_ids: FolderIds,
    metadata_templates: MetadataTemplates,
    form_url: String,
    endpoints: BoxEndpoints,
    server: ServerSettings,
    http_timeout_secs: Option<u64>,
    features: FeatureFlags,
}

impl BrokerConfigBuilder {
    /// Sets the application credentials (required).
    pub fn credentials(mut self, credentials: BoxCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn folder_ids(mut self, folder_ids: FolderIds) -> Self {
        self.folder_ids = folder_ids;
        self
    }

    pub fn metadata_templates(mut self, templates: MetadataTemplates) -> Self {
        self.metadata_templates = templates;
        self
    }

    pub fn form_url(mut self, url: impl Into<String>) -> Self {
        self.form_url = url.into();
        self
    }

    /// Points both Box endpoints somewhere else (e.g. a local stub).
    pub fn endpoints(
        mut self,
        api_base_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.endpoints = BoxEndpoints {
            api_base_url: api_base_url.into(),
            token_url: token_url.into(),
        };
        self
    }

    pub fn server(mut self, server: ServerSettings) -> Self {
        self.server = server;
        self
    }

    pub fn static_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.server.static_dir = dir.into();
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.http_timeout_secs = Some(secs);
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the [`BrokerConfig`] after validating all settings.
    pub fn build(self) -> Result<BrokerConfig> {
        let credentials = self.credentials.ok_or_else(|| {
            Error::Config(
                "Box credentials are required. Provide BOX_CLIENT_ID, BOX_CLIENT_SECRET \
                 and BOX_ENTERPRISE_ID."
                    .to_string(),
            )
        })?;

        let config = BrokerConfig {
            credentials,
            folder_ids: self.folder_ids,
            metadata_templates: self.metadata_templates,
            form_url: self.form_url,
            endpoints: self.endpoints,
            server: self.server,
            http_timeout_secs: self.http_timeout_secs,
            features: self.features,
        };

        config.validate()?;
        Ok(config)
    }
}
