use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Result, ScreenplayError};

/// An OpenRouter API key. The `Debug` impl never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derives the usable key from the raw `apiKey` config value: everything
    /// before the first `.`, or the whole value when there is no `.`.
    pub fn from_config_value(raw: &str) -> Result<Self> {
        let key = raw.split('.').next().unwrap_or_default();
        if key.is_empty() {
            return Err(ScreenplayError::InvalidConfig(
                "apiKey is empty before the first '.'".to_string(),
            ));
        }
        Ok(Self(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    api_key: String,
}

/// Process-wide default credentials, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    default_key: Option<ApiKey>,
}

impl Credentials {
    pub fn new(default_key: Option<ApiKey>) -> Self {
        Self { default_key }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let value = read_json_file(path).await?;
        let config: ConfigFile =
            serde_json::from_value(value).map_err(|source| ScreenplayError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        let key = ApiKey::from_config_value(&config.api_key)?;
        info!(path = %path.display(), "Loaded default OpenRouter API key");
        Ok(Self::new(Some(key)))
    }

    /// Like [`Credentials::load`], but a missing or broken config file only
    /// disables the default key instead of failing.
    pub async fn load_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()).await {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(
                    error = %e,
                    "No default API key; requests must send customApiKey"
                );
                Self::default()
            }
        }
    }

    pub fn default_key(&self) -> Option<&ApiKey> {
        self.default_key.as_ref()
    }

    /// Picks the per-call override when given, otherwise the default key.
    pub fn resolve(&self, custom: Option<&str>) -> Result<ApiKey> {
        match custom.filter(|k| !k.is_empty()) {
            Some(key) => Ok(ApiKey::new(key)),
            None => self
                .default_key
                .clone()
                .ok_or(ScreenplayError::MissingApiKey),
        }
    }
}

pub(crate) async fn read_json_file(path: &Path) -> Result<Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ScreenplayError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::from_str(&raw).map_err(|source| ScreenplayError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn test_key_is_truncated_at_first_dot() {
        let key = ApiKey::from_config_value("sk-ABC.suffix").unwrap();
        assert_eq!(key.expose(), "sk-ABC");

        let key = ApiKey::from_config_value("sk-or-v1-123.a.b").unwrap();
        assert_eq!(key.expose(), "sk-or-v1-123");
    }

    #[test]
    fn test_key_without_dot_is_used_whole() {
        let key = ApiKey::from_config_value("sk-plain").unwrap();
        assert_eq!(key.expose(), "sk-plain");
    }

    #[test]
    fn test_empty_key_is_rejected() {
        assert!(matches!(
            ApiKey::from_config_value(".suffix"),
            Err(ScreenplayError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = ApiKey::new("sk-secret");
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let file = write_config(r#"{"apiKey":"sk-ABC.suffix"}"#);
        let credentials = Credentials::load(file.path()).await.unwrap();
        assert_eq!(credentials.default_key().unwrap().expose(), "sk-ABC");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Credentials::load(dir.path().join("config.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScreenplayError::ConfigRead { .. }));

        let credentials = Credentials::load_or_empty(dir.path().join("config.json")).await;
        assert!(credentials.default_key().is_none());
    }

    #[tokio::test]
    async fn test_load_without_api_key_field() {
        let file = write_config(r#"{"key":"sk-ABC"}"#);
        let err = Credentials::load(file.path()).await.unwrap_err();
        assert!(matches!(err, ScreenplayError::ConfigParse { .. }));
    }

    #[test]
    fn test_custom_key_overrides_default() {
        let credentials = Credentials::new(Some(ApiKey::new("sk-default")));

        let key = credentials.resolve(Some("sk-custom")).unwrap();
        assert_eq!(key.expose(), "sk-custom");
        assert_eq!(credentials.default_key().unwrap().expose(), "sk-default");

        let key = credentials.resolve(None).unwrap();
        assert_eq!(key.expose(), "sk-default");

        let key = credentials.resolve(Some("")).unwrap();
        assert_eq!(key.expose(), "sk-default");
    }

    #[test]
    fn test_missing_key() {
        let credentials = Credentials::default();
        assert!(matches!(
            credentials.resolve(None),
            Err(ScreenplayError::MissingApiKey)
        ));
        assert!(credentials.resolve(Some("sk-custom")).is_ok());
    }
}
