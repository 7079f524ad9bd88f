use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

use crate::search::MIN_SEARCH_DEBOUNCE;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub db_path: PathBuf,
    pub search_debounce: Duration,
    /// Select the most recent conversation when the inbox opens with nothing selected.
    pub auto_select: bool,
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("plaza.db"),
            search_debounce: MIN_SEARCH_DEBOUNCE,
            auto_select: true,
            log_filter: "plaza=debug".into(),
        }
    }
}

impl ClientConfig {
    /// Read `PLAZA_*` variables, loading `.env` first if present.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(path) = get("PLAZA_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(raw) = get("PLAZA_SEARCH_DEBOUNCE_MS") {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("PLAZA_SEARCH_DEBOUNCE_MS: not a number: {raw:?}"))?;
            config.search_debounce = Duration::from_millis(ms).max(MIN_SEARCH_DEBOUNCE);
        }

        if let Some(raw) = get("PLAZA_AUTO_SELECT") {
            config.auto_select = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => bail!("PLAZA_AUTO_SELECT: expected true or false, got {raw:?}"),
            };
        }

        if let Some(filter) = get("PLAZA_LOG") {
            config.log_filter = filter;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.search_debounce, Duration::from_millis(500));
    }

    #[test]
    fn reads_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("PLAZA_DB_PATH", "/tmp/x.db"),
            ("PLAZA_SEARCH_DEBOUNCE_MS", "750"),
            ("PLAZA_AUTO_SELECT", "false"),
            ("PLAZA_LOG", "plaza=trace"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.search_debounce, Duration::from_millis(750));
        assert!(!config.auto_select);
        assert_eq!(config.log_filter, "plaza=trace");
    }

    #[test]
    fn debounce_has_a_floor() {
        let config =
            ClientConfig::from_lookup(lookup(&[("PLAZA_SEARCH_DEBOUNCE_MS", "100")])).unwrap();
        assert_eq!(config.search_debounce, Duration::from_millis(500));
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(ClientConfig::from_lookup(lookup(&[("PLAZA_SEARCH_DEBOUNCE_MS", "soon")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("PLAZA_AUTO_SELECT", "maybe")])).is_err());
    }
}
