// Proxy server configuration.
//
// Everything comes from environment variables with local development
// defaults. The LLM key is the only secret the proxy holds; tracker
// credentials arrive per request.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use casegen_common::protocol::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone)]
pub struct ProxyConfig {
    pub listen_addr: SocketAddr,
    /// LLM API key. Requests to `/api/gemini` fail with 500 while unset.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Comma-separated CORS origins (or `"*"` for any).
    pub cors_origins: Option<String>,
    /// Log filter directive (e.g. `info`, `casegen_proxy=debug`).
    pub log_filter: String,
    pub log_format: LogFormat,
    pub upstream_timeout: Duration,
}

impl ProxyConfig {
    /// Parse configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `CASEGEN_PROXY_HOST` | `0.0.0.0` |
    /// | `CASEGEN_PROXY_PORT` | `3001` |
    /// | `GEMINI_API_KEY` | *(none)* |
    /// | `CASEGEN_GEMINI_MODEL` | `gemini-1.5-flash` |
    /// | `CASEGEN_GEMINI_BASE_URL` | Google Generative Language v1beta |
    /// | `CASEGEN_PROXY_CORS_ORIGINS` | *(none, cors.rs uses dev defaults)* |
    /// | `CASEGEN_PROXY_LOG_FILTER` | `info` |
    /// | `CASEGEN_PROXY_LOG_FORMAT` | `text` (`json` for structured output) |
    /// | `CASEGEN_UPSTREAM_TIMEOUT_SECS` | `60` |
    pub fn from_env() -> Self {
        Self::from_env_fn(|key| std::env::var(key))
    }

    /// Testable constructor that accepts an environment lookup function.
    pub(crate) fn from_env_fn<F>(env: F) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let non_empty = |key: &str| env(key).ok().filter(|value| !value.trim().is_empty());

        let host = non_empty("CASEGEN_PROXY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 =
            non_empty("CASEGEN_PROXY_PORT").and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_PORT);
        let listen_addr = format!("{host}:{port}")
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)));

        let gemini_api_key = non_empty("GEMINI_API_KEY").map(|key| key.trim().to_string());
        let gemini_model =
            non_empty("CASEGEN_GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into());
        let gemini_base_url =
            non_empty("CASEGEN_GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());

        let cors_origins = non_empty("CASEGEN_PROXY_CORS_ORIGINS");
        let log_filter = non_empty("CASEGEN_PROXY_LOG_FILTER").unwrap_or_else(|| "info".into());
        let log_format = match non_empty("CASEGEN_PROXY_LOG_FORMAT").as_deref() {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let upstream_timeout = Duration::from_secs(
            non_empty("CASEGEN_UPSTREAM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        );

        Self {
            listen_addr,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            cors_origins,
            log_filter,
            log_format,
            upstream_timeout,
        }
    }
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("listen_addr", &self.listen_addr)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("cors_origins", &self.cors_origins)
            .field("log_filter", &self.log_filter)
            .field("log_format", &self.log_format)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from_map(
        map: HashMap<&'static str, &'static str>,
    ) -> impl Fn(&str) -> Result<String, std::env::VarError> {
        move |key: &str| map.get(key).map(|v| v.to_string()).ok_or(std::env::VarError::NotPresent)
    }

    #[test]
    fn defaults_when_no_env_vars() {
        let cfg = ProxyConfig::from_env_fn(env_from_map(HashMap::new()));
        assert_eq!(cfg.listen_addr.to_string(), "0.0.0.0:3001");
        assert!(cfg.gemini_api_key.is_none());
        assert_eq!(cfg.gemini_model, DEFAULT_MODEL);
        assert_eq!(cfg.gemini_base_url, DEFAULT_BASE_URL);
        assert!(cfg.cors_origins.is_none());
        assert_eq!(cfg.log_filter, "info");
        assert_eq!(cfg.log_format, LogFormat::Text);
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(60));
    }

    #[test]
    fn custom_host_and_port() {
        let mut m = HashMap::new();
        m.insert("CASEGEN_PROXY_HOST", "127.0.0.1");
        m.insert("CASEGEN_PROXY_PORT", "8787");
        let cfg = ProxyConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.listen_addr.to_string(), "127.0.0.1:8787");
    }

    #[test]
    fn invalid_port_uses_default() {
        let mut m = HashMap::new();
        m.insert("CASEGEN_PROXY_PORT", "not_a_number");
        let cfg = ProxyConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.listen_addr.port(), DEFAULT_PORT);
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut m = HashMap::new();
        m.insert("GEMINI_API_KEY", "   ");
        assert!(ProxyConfig::from_env_fn(env_from_map(m)).gemini_api_key.is_none());
    }

    #[test]
    fn api_key_is_redacted_in_debug_output() {
        let mut m = HashMap::new();
        m.insert("GEMINI_API_KEY", "AIza-secret-value");
        let cfg = ProxyConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("AIza-secret-value"));
        assert!(!format!("{cfg:?}").contains("AIza-secret-value"));
    }

    #[test]
    fn model_base_url_and_log_overrides() {
        let mut m = HashMap::new();
        m.insert("CASEGEN_GEMINI_MODEL", "gemini-2.0-pro");
        m.insert("CASEGEN_GEMINI_BASE_URL", "http://127.0.0.1:9999/v1beta");
        m.insert("CASEGEN_PROXY_LOG_FILTER", "debug,tower_http=trace");
        m.insert("CASEGEN_PROXY_LOG_FORMAT", "JSON");
        m.insert("CASEGEN_PROXY_CORS_ORIGINS", "https://qa.example");
        let cfg = ProxyConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.gemini_model, "gemini-2.0-pro");
        assert_eq!(cfg.gemini_base_url, "http://127.0.0.1:9999/v1beta");
        assert_eq!(cfg.log_filter, "debug,tower_http=trace");
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.cors_origins.as_deref(), Some("https://qa.example"));
    }

    #[test]
    fn upstream_timeout_override_and_zero_fallback() {
        let mut m = HashMap::new();
        m.insert("CASEGEN_UPSTREAM_TIMEOUT_SECS", "15");
        let cfg = ProxyConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(15));

        let mut m = HashMap::new();
        m.insert("CASEGEN_UPSTREAM_TIMEOUT_SECS", "0");
        let cfg = ProxyConfig::from_env_fn(env_from_map(m));
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(60));
    }
}
