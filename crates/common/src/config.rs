use serde_json::{json, Value};

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Exchange credentials
    pub bybit_api_key: String,
    pub bybit_api_secret: String,
    pub testnet: bool,

    // Dashboard
    pub dashboard_token: String,
    pub dashboard_port: u16,

    // Trading defaults
    pub default_leverage: u32,
    pub risk_per_trade: f64,
    pub max_open_positions: usize,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            bybit_api_key: required_env("BYBIT_API_KEY"),
            bybit_api_secret: required_env("BYBIT_API_SECRET"),
            testnet: optional_env("TESTNET")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(true),
            dashboard_token: required_env("DASHBOARD_TOKEN"),
            dashboard_port: optional_env("DASHBOARD_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            default_leverage: optional_env("DEFAULT_LEVERAGE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            risk_per_trade: optional_env("RISK_PER_TRADE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.02),
            max_open_positions: optional_env("MAX_OPEN_POSITIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        }
    }

    /// Settings snapshot for the dashboard, with secrets redacted.
    pub fn summary(&self) -> Value {
        let key_prefix = if self.bybit_api_key.is_empty() {
            String::new()
        } else {
            // chars, not bytes: a multibyte key must not split mid-char.
            let prefix: String = self.bybit_api_key.chars().take(10).collect();
            format!("{prefix}...")
        };
        json!({
            "bybit_api": {
                "BYBIT_API_KEY": key_prefix,
                "BYBIT_API_SECRET": "***",
                "TESTNET": self.testnet,
            },
            "trading": {
                "DEFAULT_LEVERAGE": self.default_leverage,
                "RISK_PER_TRADE": self.risk_per_trade,
                "MAX_OPEN_POSITIONS": self.max_open_positions,
            },
        })
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: &str) -> Config {
        Config {
            bybit_api_key: key.into(),
            bybit_api_secret: "hunter2".into(),
            testnet: true,
            dashboard_token: "token".into(),
            dashboard_port: 8000,
            default_leverage: 10,
            risk_per_trade: 0.02,
            max_open_positions: 5,
        }
    }

    #[test]
    fn summary_redacts_secrets() {
        let summary = config_with_key("abcdefghijklmnop").summary();
        assert_eq!(summary["bybit_api"]["BYBIT_API_KEY"], "abcdefghij...");
        assert_eq!(summary["bybit_api"]["BYBIT_API_SECRET"], "***");
    }

    #[test]
    fn summary_handles_short_and_multibyte_keys() {
        let summary = config_with_key("").summary();
        assert_eq!(summary["bybit_api"]["BYBIT_API_KEY"], "");

        let summary = config_with_key("short").summary();
        assert_eq!(summary["bybit_api"]["BYBIT_API_KEY"], "short...");

        // 12 Cyrillic chars; byte 10 falls inside a char.
        let summary = config_with_key("ключключключ").summary();
        assert_eq!(summary["bybit_api"]["BYBIT_API_KEY"], "ключключкл...");
    }
}
