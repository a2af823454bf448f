//! The server's variable table.

use crate::{Catalog, ConfigVariable, DefinitionError, ExternalBinding};

#[derive(Clone, Copy)]
enum Lit {
    Str(&'static str),
    Int(i64),
    Bool(bool),
}

struct Entry {
    key: &'static str,
    default: Lit,
    flag: &'static str,
    env: &'static str,
    usage: &'static str,
}

const fn entry(
    key: &'static str,
    default: Lit,
    flag: &'static str,
    env: &'static str,
    usage: &'static str,
) -> Entry {
    Entry {
        key,
        default,
        flag,
        env,
        usage,
    }
}

use Lit::{Bool, Int, Str};

#[rustfmt::skip]
const STANDARD: &[Entry] = &[
    entry("genindex", Bool(false), "gen-index", "GEN_INDEX", "generate index.yaml, print to stdout and exit"),
    entry("debug", Bool(false), "debug", "DEBUG", "show debug messages"),
    entry("logjson", Bool(false), "log-json", "LOG_JSON", "output structured logs as json"),
    entry("disablemetrics", Bool(false), "disable-metrics", "DISABLE_METRICS", "disable Prometheus metrics"),
    entry("disableapi", Bool(false), "disable-api", "DISABLE_API", "disable all routes prefixed with /api"),
    entry("allowoverwrite", Bool(false), "allow-overwrite", "ALLOW_OVERWRITE", "allow chart versions to be re-uploaded"),
    entry("port", Int(8080), "port", "PORT", "port to listen on"),
    entry("charturl", Str(""), "chart-url", "CHART_URL", "absolute url for .tgzs in index.yaml"),
    entry("basicauth.user", Str(""), "basic-auth-user", "BASIC_AUTH_USER", "username for basic http authentication"),
    entry("basicauth.pass", Str(""), "basic-auth-pass", "BASIC_AUTH_PASS", "password for basic http authentication"),
    entry("authanonymousget", Bool(false), "auth-anonymous-get", "AUTH_ANONYMOUS_GET", "allow anonymous GET operations when auth is used"),
    entry("tls.cert", Str(""), "tls-cert", "TLS_CERT", "path to tls certificate chain file"),
    entry("tls.key", Str(""), "tls-key", "TLS_KEY", "path to tls key file"),
    entry("storage.backend", Str(""), "storage", "STORAGE", "storage backend, can be one of: local, amazon, google, microsoft, alibaba"),
    entry("storage.local.rootdir", Str(""), "storage-local-rootdir", "STORAGE_LOCAL_ROOTDIR", "directory to store charts for local storage backend"),
    entry("storage.amazon.bucket", Str(""), "storage-amazon-bucket", "STORAGE_AMAZON_BUCKET", "s3 bucket to store charts for amazon storage backend"),
    entry("storage.amazon.prefix", Str(""), "storage-amazon-prefix", "STORAGE_AMAZON_PREFIX", "prefix to store charts for --storage-amazon-bucket"),
    entry("storage.amazon.region", Str(""), "storage-amazon-region", "STORAGE_AMAZON_REGION", "region of --storage-amazon-bucket"),
    entry("storage.amazon.endpoint", Str(""), "storage-amazon-endpoint", "STORAGE_AMAZON_ENDPOINT", "alternative s3 endpoint"),
    entry("storage.amazon.sse", Str(""), "storage-amazon-sse", "STORAGE_AMAZON_SSE", "server side encryption algorithm"),
    entry("storage.google.bucket", Str(""), "storage-google-bucket", "STORAGE_GOOGLE_BUCKET", "gcs bucket to store charts for google storage backend"),
    entry("storage.google.prefix", Str(""), "storage-google-prefix", "STORAGE_GOOGLE_PREFIX", "prefix to store charts for --storage-google-bucket"),
    entry("storage.microsoft.container", Str(""), "storage-microsoft-container", "STORAGE_MICROSOFT_CONTAINER", "container to store charts for microsoft storage backend"),
    entry("storage.microsoft.prefix", Str(""), "storage-microsoft-prefix", "STORAGE_MICROSOFT_PREFIX", "prefix to store charts for --storage-microsoft-container"),
    entry("storage.alibaba.bucket", Str(""), "storage-alibaba-bucket", "STORAGE_ALIBABA_BUCKET", "OSS bucket to store charts for Alibaba Cloud storage backend"),
    entry("storage.alibaba.prefix", Str(""), "storage-alibaba-prefix", "STORAGE_ALIBABA_PREFIX", "prefix to store charts for --storage-alibaba-bucket"),
    entry("storage.alibaba.endpoint", Str(""), "storage-alibaba-endpoint", "STORAGE_ALIBABA_ENDPOINT", "OSS endpoint"),
    entry("storage.alibaba.sse", Str(""), "storage-alibaba-sse", "STORAGE_ALIBABA_SSE", "server side encryption algorithm for Alibaba Cloud storage backend, AES256 or KMS"),
    entry("chartpostformfieldname", Str("chart"), "chart-post-form-field-name", "CHART_POST_FORM_FIELD_NAME", "form field which will be queried for the chart file content"),
    entry("provpostformfieldname", Str("prov"), "prov-post-form-field-name", "PROV_POST_FORM_FIELD_NAME", "form field which will be queried for the provenance file content"),
    entry("indexlimit", Int(0), "index-limit", "INDEX_LIMIT", "parallel scan limit for the repo indexer"),
    entry("contextpath", Str(""), "context-path", "CONTEXT_PATH", "base context path"),
    entry("depth", Int(0), "depth", "DEPTH", "levels of nested repos for multitenancy"),
];

impl Entry {
    fn variable(&self) -> ConfigVariable {
        let var = match self.default {
            Str(s) => ConfigVariable::string(self.key, s),
            Int(i) => ConfigVariable::int(self.key, i),
            Bool(b) => ConfigVariable::bool(self.key, b),
        };
        var.with_binding(ExternalBinding::new(self.flag, self.env, self.usage))
    }
}

impl Catalog {
    /// The full set of variables recognized by the server, in table order.
    ///
    /// # Errors
    ///
    /// Only fails if the built-in table itself breaks a catalog invariant.
    pub fn standard() -> Result<Self, DefinitionError> {
        Self::from_variables(STANDARD.iter().map(Entry::variable))
    }
}
