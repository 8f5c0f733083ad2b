use serde::{Deserialize, Deserializer};
use std::net::IpAddr;
use std::time::Duration;

/// Origins accepted when `ALLOWED_ORIGINS` is unset or empty.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "https://satta-matka-frotend-code.vercel.app",
    "https://satta-matka-frotend-code-gpqv7aox4-abhishek069s-projects.vercel.app",
];

pub const DEFAULT_MONGO_URI: &str = "mongodb://127.0.0.1:27017/SattaMatka";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
/// 50 MiB, applied to both JSON and urlencoded bodies.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_MONGO_CONNECT_TIMEOUT_SECS: u64 = 10;

/// The root configuration structure for the entire application.
///
/// Every field maps to an environment variable of the same name in upper
/// case (`mongo_uri` <- `MONGO_URI`). Defaults are registered on the builder
/// in [`crate::load_settings_from`], so a bare environment still yields a
/// runnable development configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// TCP port the server-mode listener binds to.
    pub port: u16,
    /// Interface the server-mode listener binds to.
    pub bind_host: IpAddr,
    /// Origins permitted to make cross-origin requests.
    pub allowed_origins: AllowList,
    /// Connection string of the document database.
    pub mongo_uri: String,
    /// Deployment environment. Only `production` is significant.
    pub app_env: AppEnvironment,
    /// Maximum accepted request body size, in bytes.
    pub body_limit_bytes: usize,
    /// Server-selection timeout for the single connection handshake.
    pub mongo_connect_timeout_secs: u64,
    /// Set by the function platform for every per-invocation process.
    #[serde(default)]
    pub aws_lambda_function_name: Option<String>,
    /// `host:port` of the platform's invocation API.
    #[serde(default)]
    pub aws_lambda_runtime_api: Option<String>,
}

impl Settings {
    pub fn is_production(&self) -> bool {
        self.app_env == AppEnvironment::Production
    }

    pub fn mongo_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.mongo_connect_timeout_secs)
    }

    /// True when the process was started by the function platform.
    pub fn is_function_invocation(&self) -> bool {
        self.aws_lambda_function_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }
}

/// Deployment environment flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum AppEnvironment {
    #[default]
    Development,
    Production,
}

impl From<String> for AppEnvironment {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            AppEnvironment::Production
        } else {
            AppEnvironment::Development
        }
    }
}

/// How the process receives requests. Resolved exactly once at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ExecutionMode {
    /// Bind a TCP listener and serve until shutdown.
    Server,
    /// Handle one platform trigger event at a time.
    Adapter,
}

impl ExecutionMode {
    /// Picks the mode from the environment signals carried by `settings`.
    ///
    /// A function-platform process always runs the adapter. Everything else,
    /// production included, binds a listener: a native binary has no outer
    /// host to hand the application to.
    pub fn resolve(settings: &Settings) -> Self {
        if settings.is_function_invocation() {
            ExecutionMode::Adapter
        } else {
            ExecutionMode::Server
        }
    }
}

/// Ordered, de-duplicated set of permitted origins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AllowList {
    origins: Vec<String>,
}

impl AllowList {
    /// Parses a comma-separated list, trimming entries and dropping empties.
    pub fn parse(csv: &str) -> Self {
        let mut origins: Vec<String> = Vec::new();
        for origin in csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !origins.iter().any(|known| known == origin) {
                origins.push(origin.to_string());
            }
        }
        Self { origins }
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.origins.iter().any(|known| known == origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.origins.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_host: IpAddr::from([0, 0, 0, 0]),
            allowed_origins: AllowList::parse(&DEFAULT_ALLOWED_ORIGINS.join(",")),
            mongo_uri: DEFAULT_MONGO_URI.to_string(),
            app_env: AppEnvironment::Development,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            mongo_connect_timeout_secs: DEFAULT_MONGO_CONNECT_TIMEOUT_SECS,
            aws_lambda_function_name: None,
            aws_lambda_runtime_api: None,
        }
    }
}

impl<'de> Deserialize<'de> for AllowList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let csv = String::deserialize(deserializer)?;
        Ok(AllowList::parse(&csv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_trims_and_drops_empty_entries() {
        let list = AllowList::parse(" http://a.test , ,https://b.test,");

        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["http://a.test", "https://b.test"]);
        assert!(list.contains("https://b.test"));
        assert!(!list.contains("https://c.test"));
    }

    #[test]
    fn allow_list_keeps_first_occurrence_order() {
        let list = AllowList::parse("https://b.test,http://a.test,https://b.test");

        assert_eq!(list.len(), 2);
        assert_eq!(list.iter().next(), Some("https://b.test"));
    }

    #[test]
    fn allow_list_match_is_exact() {
        let list = AllowList::parse("http://localhost:5173");

        assert!(!list.contains("http://localhost:5173/"));
        assert!(!list.contains("http://localhost"));
    }

    #[test]
    fn environment_flag_only_recognises_production() {
        assert_eq!(AppEnvironment::from("production".to_string()), AppEnvironment::Production);
        assert_eq!(AppEnvironment::from("PRODUCTION".to_string()), AppEnvironment::Production);
        assert_eq!(AppEnvironment::from("staging".to_string()), AppEnvironment::Development);
    }

    #[test]
    fn function_name_selects_adapter_mode() {
        let mut settings = Settings::default();
        assert_eq!(ExecutionMode::resolve(&settings), ExecutionMode::Server);

        settings.aws_lambda_function_name = Some("matka-api".to_string());
        assert_eq!(ExecutionMode::resolve(&settings), ExecutionMode::Adapter);
    }

    #[test]
    fn production_without_function_name_still_serves() {
        let settings = Settings {
            app_env: AppEnvironment::Production,
            aws_lambda_function_name: Some("   ".to_string()),
            ..Settings::default()
        };

        assert_eq!(ExecutionMode::resolve(&settings), ExecutionMode::Server);
    }
}
