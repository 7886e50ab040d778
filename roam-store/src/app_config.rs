use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub email: EmailConfig,
    pub uploads: UploadsConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// No url means the in-memory store.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    pub key_id: String,
    pub key_secret: String,
    pub base_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// No smtp_host means mail is only logged.
#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub from: String,
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadsConfig {
    pub dir: String,
    pub public_base: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub brand_name: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `ROAM__PAYMENTS__KEY_SECRET=...`
            .add_source(config::Environment::with_prefix("ROAM").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_keys() {
        let raw = r#"
            [server]
            port = 8080
            [auth]
            jwt_secret = "s"
            jwt_expiration_seconds = 3600
            [payments]
            key_id = "rzp_test"
            key_secret = "secret"
            base_url = "https://api.razorpay.com"
            [email]
            from = "Roam <noreply@roam.test>"
            [uploads]
            dir = "uploads"
            public_base = "http://localhost:8080/uploads"
            [business_rules]
            brand_name = "Roam"
        "#;
        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(cfg.database.url.is_none());
        assert!(cfg.email.smtp_host.is_none());
        assert_eq!(cfg.email.smtp_port, 587);
        assert_eq!(cfg.payments.currency, "INR");
        assert_eq!(cfg.payments.timeout_ms, 10_000);
    }
}
