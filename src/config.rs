use crate::error::{Error, Result};
use crate::osf::{DEFAULT_API_URL, DEFAULT_TIMEOUT};
use crate::retry::{Backoff, RetryPolicy};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = ".osf_config";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsfConfig {
    pub token: String,
    pub project: Option<String>,
    pub api_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for OsfConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            project: None,
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl OsfConfig {
    /// Reads a `KEY=VALUE` file. A missing file gives the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        match fs::read_to_string(path.as_ref()) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut map = HashMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((k, v)) = line.split_once('=') {
                let key = k.trim();
                let val = v.trim().trim_matches('"');
                map.insert(key, val);
            }
        }

        let mut config = Self::default();
        if let Some(token) = map.get("OSF_TOKEN") {
            config.token = (*token).to_string();
        }
        if let Some(project) = map.get("OSF_PROJECT").filter(|p| !p.is_empty()) {
            config.project = Some((*project).to_string());
        }
        if let Some(url) = map.get("OSF_API_URL") {
            config.api_url = (*url).to_string();
        }
        if let Some(secs) = map.get("OSF_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_number("OSF_TIMEOUT_SECS", secs)?);
        }
        if let Some(attempts) = map.get("OSF_MAX_ATTEMPTS") {
            let attempts = parse_number("OSF_MAX_ATTEMPTS", attempts)?;
            let attempts = u32::try_from(attempts)
                .map_err(|_| Error::Config(format!("OSF_MAX_ATTEMPTS out of range: {attempts}")))?;
            config.retry = config.retry.with_max_attempts(attempts);
        }
        if let Some(ms) = map.get("OSF_BACKOFF_MS") {
            let ms = parse_number("OSF_BACKOFF_MS", ms)?;
            config.retry = config.retry.with_backoff(backoff_from_millis(ms));
        }

        Ok(config)
    }
}

/// Fixed delay between attempts; zero disables waiting.
#[must_use]
pub fn backoff_from_millis(ms: u64) -> Backoff {
    if ms == 0 {
        Backoff::Immediate
    } else {
        Backoff::Fixed(Duration::from_millis(ms))
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a whole number, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config() {
        let config = OsfConfig::parse(
            "# OSF access\nOSF_TOKEN=\"abc\"\nOSF_PROJECT = xyz98\n\nOSF_MAX_ATTEMPTS=5\nOSF_BACKOFF_MS=0\n",
        )
        .unwrap();

        assert_eq!(config.token, "abc");
        assert_eq!(config.project.as_deref(), Some("xyz98"));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.backoff, Backoff::Immediate);
    }

    #[test]
    fn test_parse_config_bad_number() {
        let err = OsfConfig::parse("OSF_TIMEOUT_SECS=soon").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "OSF_TOKEN=secret").unwrap();
        writeln!(file, "OSF_TIMEOUT_SECS=5").unwrap();
        writeln!(file, "OSF_BACKOFF_MS=250").unwrap();

        let config = OsfConfig::load(file.path()).unwrap();
        assert_eq!(config.token, "secret");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry.backoff, Backoff::Fixed(Duration::from_millis(250)));
        assert!(config.project.is_none());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = OsfConfig::load(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config, OsfConfig::default());
    }
}
