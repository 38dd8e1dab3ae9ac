//! Connection target configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Fixed path of the bridge's WebSocket endpoint.
pub const ENDPOINT_PATH: &str = "/interface";

/// Host and port of the bridge to connect to.
///
/// Missing fields fall back to [`DEFAULT_HOST`] and [`DEFAULT_PORT`] when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Default for Target {
    #[inline(always)]
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl Target {
    #[inline(always)]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the WebSocket URL of the bridge endpoint, e.g.
    /// `ws://127.0.0.1:8080/interface`.
    pub fn url(&self) -> String {
        let Self { host, port } = self;

        // bare IPv6 literals need brackets in URLs
        if host.contains(':') && !host.starts_with('[') {
            format!("ws://[{host}]:{port}{ENDPOINT_PATH}")
        } else {
            format!("ws://{host}:{port}{ENDPOINT_PATH}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simpleosc_proto::serde_json;

    #[test]
    fn default_url() {
        assert_eq!(Target::default().url(), "ws://127.0.0.1:8080/interface");
    }

    #[test]
    fn custom_urls() {
        assert_eq!(
            Target::new("localhost", 9000).url(),
            "ws://localhost:9000/interface"
        );
        assert_eq!(Target::new("::1", 8080).url(), "ws://[::1]:8080/interface");
        assert_eq!(
            Target::new("[::1]", 8080).url(),
            "ws://[::1]:8080/interface"
        );
    }

    #[test]
    fn partial_config_uses_defaults() {
        let target: Target = serde_json::from_str(r#"{"port":4000}"#).unwrap();
        assert_eq!(target, Target::new(DEFAULT_HOST, 4000));

        let target: Target = serde_json::from_str("{}").unwrap();
        assert_eq!(target, Target::default());
    }
}
