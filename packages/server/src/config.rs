//! Server settings read from the environment.

/// Listener and CORS settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind (`BIND_ADDR`, default `0.0.0.0`).
    pub bind_addr: String,
    /// Port to bind (`PORT`, default `3000`).
    pub port: u16,
    /// Only origin allowed by CORS (`FRONTEND_URL`); any origin when unset.
    pub frontend_url: Option<String>,
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);
        let frontend_url = lookup("FRONTEND_URL").filter(|url| !url.trim().is_empty());

        Self {
            bind_addr,
            port,
            frontend_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        assert_eq!(
            config(&[]),
            ServerConfig {
                bind_addr: "0.0.0.0".to_string(),
                port: 3000,
                frontend_url: None,
            }
        );
    }

    #[test]
    fn overrides_and_bad_port() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1"),
            ("PORT", "8081"),
            ("FRONTEND_URL", "https://dispatch.example.org"),
        ]);
        assert_eq!(cfg.bind_addr, "127.0.0.1");
        assert_eq!(cfg.port, 8081);
        assert_eq!(
            cfg.frontend_url.as_deref(),
            Some("https://dispatch.example.org")
        );

        assert_eq!(config(&[("PORT", "http")]).port, 3000);
        assert_eq!(config(&[("FRONTEND_URL", " ")]).frontend_url, None);
    }
}
