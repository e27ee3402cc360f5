//! Loading client settings from files and the environment.

use crate::error::{M2mClientError, Result};
use crate::types::{ClientConfig, Credentials};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Everything needed to build an [`M2mClient`](crate::M2mClient).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub credentials: Credentials,

    #[serde(default)]
    pub api: ClientConfig,
}

impl Settings {
    /// Load from `m2m.toml` if present, overridden by `M2M_` environment
    /// variables (e.g. `M2M_CREDENTIALS__CLIENT_ID`, `M2M_API__DEBUG`).
    ///
    /// Environment values are kept as strings so numeric-looking secrets
    /// survive intact; typed fields are converted during deserialization.
    pub fn load() -> Result<Self> {
        Self::load_from(PathBuf::from("m2m.toml"))
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        let path = path.as_ref();
        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("M2M")
                .prefix_separator("_")
                .separator("__"),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML document, without consulting the environment.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings: Self = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let creds = &self.credentials;
        let missing = [
            ("username", &creds.username),
            ("password", &creds.password),
            ("client_id", &creds.client_id),
            ("client_secret", &creds.client_secret),
        ]
        .into_iter()
        .find(|(_, value)| value.is_empty());

        if let Some((name, _)) = missing {
            return Err(M2mClientError::Config(format!(
                "credentials.{} is required (set M2M_CREDENTIALS__{})",
                name,
                name.to_uppercase()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RefreshMode, DEFAULT_API_URL};

    const CREDENTIALS: &str = r#"
[credentials]
username = "user"
password = "pass"
client_id = "cid"
client_secret = "secret"
"#;

    #[test]
    fn defaults_fill_missing_api_section() {
        let settings = Settings::from_toml_str(CREDENTIALS).unwrap();

        assert_eq!(settings.credentials.username, "user");
        assert_eq!(settings.credentials.client_secret, "secret");
        assert_eq!(settings.api.base_url, DEFAULT_API_URL);
        assert!(!settings.api.debug);
        assert_eq!(settings.api.refresh_mode, RefreshMode::Refreshing);
    }

    #[test]
    fn api_section_overrides() {
        let api = r#"
[api]
base_url = "http://localhost:9000"
debug = true
scope = "read"
refresh_mode = "eager"
"#;
        let toml = format!("{}{}", CREDENTIALS, api);
        let settings = Settings::from_toml_str(&toml).unwrap();

        assert_eq!(settings.api.base_url, "http://localhost:9000");
        assert!(settings.api.debug);
        assert_eq!(settings.api.scope, "read");
        assert_eq!(settings.api.home, "devices");
        assert_eq!(settings.api.refresh_mode, RefreshMode::Eager);
    }

    #[test]
    fn empty_credential_rejected() {
        let toml = CREDENTIALS.replace("client_id = \"cid\"", "client_id = \"\"");
        match Settings::from_toml_str(&toml).unwrap_err() {
            M2mClientError::Config(msg) => assert!(msg.contains("client_id")),
            e => panic!("Expected Config error, got: {:?}", e),
        }
    }

    #[test]
    fn env_credentials_keep_numeric_looking_values() {
        let vars = [
            ("M2M_CREDENTIALS__USERNAME", "user"),
            ("M2M_CREDENTIALS__PASSWORD", "0123"),
            ("M2M_CREDENTIALS__CLIENT_ID", "007"),
            ("M2M_CREDENTIALS__CLIENT_SECRET", "1.50"),
            ("M2M_API__DEBUG", "true"),
            ("M2M_API__REFRESH_MODE", "eager"),
        ];
        for (key, value) in vars {
            std::env::set_var(key, value);
        }

        let result = Settings::load_from("does-not-exist/m2m.toml");

        for (key, _) in vars {
            std::env::remove_var(key);
        }

        let settings = result.unwrap();
        assert_eq!(settings.credentials.username, "user");
        assert_eq!(settings.credentials.password, "0123");
        assert_eq!(settings.credentials.client_id, "007");
        assert_eq!(settings.credentials.client_secret, "1.50");
        assert!(settings.api.debug);
        assert_eq!(settings.api.refresh_mode, RefreshMode::Eager);
    }

    #[test]
    fn missing_credentials_section_rejected() {
        let result = Settings::from_toml_str("[api]\ndebug = true\n");
        assert!(matches!(result, Err(M2mClientError::Config(_))));
    }
}
