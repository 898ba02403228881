use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::dashboard::ProgressBasis;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REFRESH_MS: u32 = 5_000;

/// 刷新间隔下拉框的可选值（毫秒）。
pub const REFRESH_CHOICES_MS: [u32; 6] = [1_000, 2_000, 5_000, 10_000, 30_000, 60_000];

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppProfile {
    Dev,
    Prod,
}

impl AppProfile {
    pub fn from_env(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("prod") | Some("production") => Self::Prod,
            _ => Self::Dev,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub profile: AppProfile,
    pub request_timeout: Duration,
    pub default_refresh_ms: u32,
    pub progress_basis: ProgressBasis,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            profile: AppProfile::Dev,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            default_refresh_ms: DEFAULT_REFRESH_MS,
            progress_basis: ProgressBasis::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        crate::config::load_dotenv();

        Self::from_lookup(read_env)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("PIPELINE_API_BASE_URL") {
            config.api_base_url = url;
        }

        let profile_raw = lookup("PIPELINE_PROFILE");
        config.profile = AppProfile::from_env(profile_raw);

        if let Some(secs) =
            lookup("PIPELINE_REQUEST_TIMEOUT_SECS").and_then(|value| value.parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_secs(secs.max(1));
        }

        if let Some(ms) = lookup("PIPELINE_REFRESH_MS").and_then(|value| value.parse::<u32>().ok())
        {
            config.default_refresh_ms = nearest_refresh_choice(ms);
        }

        if let Some(basis) = lookup("PIPELINE_PROGRESS_BASIS") {
            match ProgressBasis::parse(&basis) {
                Some(parsed) => config.progress_basis = parsed,
                None => tracing::warn!(%basis, "unknown progress basis, keeping default"),
            }
        }

        config
    }
}

/// 把任意毫秒值吸附到最近的可选刷新间隔上。
pub fn nearest_refresh_choice(ms: u32) -> u32 {
    REFRESH_CHOICES_MS
        .iter()
        .copied()
        .min_by_key(|choice| choice.abs_diff(ms))
        .unwrap_or(DEFAULT_REFRESH_MS)
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .or_else(|| option_env_from_build(key).map(|s| s.to_string()))
}

fn option_env_from_build(key: &str) -> Option<&'static str> {
    match key {
        "PIPELINE_API_BASE_URL" => option_env!("PIPELINE_API_BASE_URL"),
        "PIPELINE_PROFILE" => option_env!("PIPELINE_PROFILE"),
        "PIPELINE_REQUEST_TIMEOUT_SECS" => option_env!("PIPELINE_REQUEST_TIMEOUT_SECS"),
        "PIPELINE_REFRESH_MS" => option_env!("PIPELINE_REFRESH_MS"),
        "PIPELINE_PROGRESS_BASIS" => option_env!("PIPELINE_PROGRESS_BASIS"),
        _ => None,
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_dotenv() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!("failed to load .env: {err}");
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[inline]
pub fn load_dotenv() {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.default_refresh_ms, DEFAULT_REFRESH_MS);
        assert_eq!(config.progress_basis, ProgressBasis::Processed);
        assert_eq!(config.profile, AppProfile::Dev);
    }

    #[test]
    fn environment_overrides_are_normalized() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PIPELINE_API_BASE_URL", "http://10.0.0.2:5005/"),
            ("PIPELINE_REQUEST_TIMEOUT_SECS", "0"),
            ("PIPELINE_REFRESH_MS", "2500"),
            ("PIPELINE_PROGRESS_BASIS", "processed_plus_failed"),
            ("PIPELINE_PROFILE", "prod"),
        ]));
        assert_eq!(config.api_base_url, "http://10.0.0.2:5005/");
        assert_eq!(config.request_timeout, Duration::from_secs(1));
        assert_eq!(config.default_refresh_ms, 2_000);
        assert_eq!(config.progress_basis, ProgressBasis::ProcessedPlusFailed);
        assert_eq!(config.profile, AppProfile::Prod);
    }

    #[test]
    fn unknown_progress_basis_keeps_default() {
        let config = AppConfig::from_lookup(lookup_from(&[("PIPELINE_PROGRESS_BASIS", "eta")]));
        assert_eq!(config.progress_basis, ProgressBasis::Processed);
    }

    #[test]
    fn refresh_choice_snaps_to_nearest() {
        assert_eq!(nearest_refresh_choice(1), 1_000);
        assert_eq!(nearest_refresh_choice(5_000), 5_000);
        assert_eq!(nearest_refresh_choice(45_001), 60_000);
        assert_eq!(nearest_refresh_choice(u32::MAX), 60_000);
    }
}
