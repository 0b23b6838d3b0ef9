use std::path::PathBuf;
use std::time::Duration;

use screenplay_core::OpenRouterOptions;

/// Process settings, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub port: u16,
    pub config_path: PathBuf,
    pub format_path: PathBuf,
    pub debug: bool,
    pub openrouter: OpenRouterOptions,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            port: 3000,
            config_path: PathBuf::from("./config.json"),
            format_path: PathBuf::from("./responseFormat.json"),
            debug: false,
            openrouter: OpenRouterOptions::default(),
        }
    }
}

impl ServiceSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(defaults.port),
            config_path: lookup("SCREENPLAY_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_path),
            format_path: lookup("SCREENPLAY_FORMAT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.format_path),
            debug: lookup("SCREENPLAY_DEBUG")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.debug),
            openrouter: OpenRouterOptions {
                base_url: lookup("OPENROUTER_BASE_URL"),
                timeout: lookup("OPENROUTER_TIMEOUT_SECS")
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs),
                referer: lookup("OPENROUTER_REFERER"),
                title: lookup("OPENROUTER_TITLE"),
            },
        }
    }
}

/// `true`, `1`, `yes` and `on` (any case) enable a flag.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> ServiceSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceSettings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(&[]);
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.config_path, PathBuf::from("./config.json"));
        assert_eq!(settings.format_path, PathBuf::from("./responseFormat.json"));
        assert!(!settings.debug);
        assert!(settings.openrouter.base_url.is_none());
        assert!(settings.openrouter.timeout.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = settings_from(&[
            ("PORT", "8080"),
            ("SCREENPLAY_DEBUG", "TRUE"),
            ("OPENROUTER_BASE_URL", "http://localhost:9999/v1"),
            ("OPENROUTER_TIMEOUT_SECS", "90"),
        ]);
        assert_eq!(settings.port, 8080);
        assert!(settings.debug);
        assert_eq!(
            settings.openrouter.base_url.as_deref(),
            Some("http://localhost:9999/v1")
        );
        assert_eq!(settings.openrouter.timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let settings = settings_from(&[("PORT", "eighty"), ("OPENROUTER_TIMEOUT_SECS", "-1")]);
        assert_eq!(settings.port, 3000);
        assert!(settings.openrouter.timeout.is_none());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("yes"));
        assert!(parse_flag(" 1 "));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
