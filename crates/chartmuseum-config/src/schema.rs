//! Typed settings view.
//!
//! [`Settings`] is the shape the rest of the server reads after resolution.
//! Field names follow the catalog's dotted keys through serde renames, so a
//! resolved configuration deserializes straight into it. Values are not
//! checked for business meaning here; a storage backend name, for example,
//! is validated by the storage layer.

use serde::{Deserialize, Serialize};

/// Effective server settings.
///
/// # Example
///
/// ```
/// use chartmuseum_config::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.port, 8080);
/// assert_eq!(settings.chart_post_form_field_name, "chart");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Generate index.yaml, print it and exit.
    #[serde(rename = "genindex")]
    pub gen_index: bool,

    /// Show debug messages.
    pub debug: bool,

    /// Emit structured logs as JSON.
    #[serde(rename = "logjson")]
    pub log_json: bool,

    /// Disable Prometheus metrics.
    #[serde(rename = "disablemetrics")]
    pub disable_metrics: bool,

    /// Disable all routes prefixed with /api.
    #[serde(rename = "disableapi")]
    pub disable_api: bool,

    /// Allow chart versions to be re-uploaded.
    #[serde(rename = "allowoverwrite")]
    pub allow_overwrite: bool,

    /// Port to listen on.
    pub port: i64,

    /// Absolute URL for .tgz files in index.yaml.
    #[serde(rename = "charturl")]
    pub chart_url: String,

    /// Basic HTTP authentication.
    #[serde(rename = "basicauth")]
    pub basic_auth: BasicAuthSettings,

    /// Allow anonymous GET operations when auth is used.
    #[serde(rename = "authanonymousget")]
    pub auth_anonymous_get: bool,

    /// TLS files.
    pub tls: TlsSettings,

    /// Storage backend selection and per-backend settings.
    pub storage: StorageSettings,

    /// Form field holding the chart file content.
    #[serde(rename = "chartpostformfieldname")]
    pub chart_post_form_field_name: String,

    /// Form field holding the provenance file content.
    #[serde(rename = "provpostformfieldname")]
    pub prov_post_form_field_name: String,

    /// Parallel scan limit for the repo indexer.
    #[serde(rename = "indexlimit")]
    pub index_limit: i64,

    /// Base context path.
    #[serde(rename = "contextpath")]
    pub context_path: String,

    /// Levels of nested repos for multitenancy.
    pub depth: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gen_index: false,
            debug: false,
            log_json: false,
            disable_metrics: false,
            disable_api: false,
            allow_overwrite: false,
            port: 8080,
            chart_url: String::new(),
            basic_auth: BasicAuthSettings::default(),
            auth_anonymous_get: false,
            tls: TlsSettings::default(),
            storage: StorageSettings::default(),
            chart_post_form_field_name: "chart".to_string(),
            prov_post_form_field_name: "prov".to_string(),
            index_limit: 0,
            context_path: String::new(),
            depth: 0,
        }
    }
}

/// Basic HTTP authentication credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicAuthSettings {
    /// Username.
    pub user: String,
    /// Password.
    pub pass: String,
}

impl BasicAuthSettings {
    /// Whether both a user and a password are set.
    pub fn is_enabled(&self) -> bool {
        !self.user.is_empty() && !self.pass.is_empty()
    }
}

/// TLS certificate and key paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsSettings {
    /// Certificate chain file.
    pub cert: String,
    /// Private key file.
    pub key: String,
}

impl TlsSettings {
    /// Whether both files are set.
    pub fn is_enabled(&self) -> bool {
        !self.cert.is_empty() && !self.key.is_empty()
    }
}

/// Storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Backend name: local, amazon, google, microsoft or alibaba.
    pub backend: String,
    /// Local filesystem backend.
    pub local: LocalStorageSettings,
    /// Amazon S3 backend.
    pub amazon: AmazonStorageSettings,
    /// Google Cloud Storage backend.
    pub google: GoogleStorageSettings,
    /// Microsoft Azure Blob backend.
    pub microsoft: MicrosoftStorageSettings,
    /// Alibaba Cloud OSS backend.
    pub alibaba: AlibabaStorageSettings,
}

/// Local filesystem backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalStorageSettings {
    /// Directory holding charts.
    pub rootdir: String,
}

/// Amazon S3 backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmazonStorageSettings {
    /// Bucket name.
    pub bucket: String,
    /// Key prefix inside the bucket.
    pub prefix: String,
    /// Bucket region.
    pub region: String,
    /// Alternative S3 endpoint.
    pub endpoint: String,
    /// Server side encryption algorithm.
    pub sse: String,
}

/// Google Cloud Storage backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleStorageSettings {
    /// Bucket name.
    pub bucket: String,
    /// Object prefix inside the bucket.
    pub prefix: String,
}

/// Microsoft Azure Blob backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicrosoftStorageSettings {
    /// Container name.
    pub container: String,
    /// Blob prefix inside the container.
    pub prefix: String,
}

/// Alibaba Cloud OSS backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlibabaStorageSettings {
    /// Bucket name.
    pub bucket: String,
    /// Object prefix inside the bucket.
    pub prefix: String,
    /// OSS endpoint.
    pub endpoint: String,
    /// Server side encryption: AES256 or KMS.
    pub sse: String,
}
