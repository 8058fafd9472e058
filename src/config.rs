use std::env;
use std::path::PathBuf;

use crate::utils::AppError;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// Runtime configuration, read once at start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Lower-case, without the leading `@`.
    pub college_domain: String,
    pub admin_emails: Vec<String>,
    pub firebase_project_id: String,
    pub service_account_path: Option<PathBuf>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub cors_origins: Vec<String>,
    pub event_sweep_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("{} must be set", key)))
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| AppError::Config(format!("PORT is not a valid port: {}", raw)))?,
            None => 5000,
        };

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                AppError::Config(format!("MAX_UPLOAD_BYTES is not a number: {}", raw))
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let event_sweep_interval_secs = match get("EVENT_SWEEP_INTERVAL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    AppError::Config(format!("EVENT_SWEEP_INTERVAL_SECS must be positive: {}", raw))
                })?,
            None => DEFAULT_SWEEP_INTERVAL_SECS,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: required("DATABASE_URL")?,
            college_domain: normalize_domain(&required("COLLEGE_DOMAIN")?),
            admin_emails: split_list(&get("ADMIN_EMAILS").unwrap_or_default())
                .into_iter()
                .map(|email| email.to_lowercase())
                .collect(),
            firebase_project_id: required("FIREBASE_PROJECT_ID")?,
            service_account_path: get("GOOGLE_APPLICATION_CREDENTIALS")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            upload_dir: PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string())),
            max_upload_bytes,
            cors_origins: split_list(
                &get("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
            ),
            event_sweep_interval_secs,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn normalize_domain(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_lowercase()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "mongodb://localhost:27017/alumni_connect"),
        ("COLLEGE_DOMAIN", "@College.EDU"),
        ("FIREBASE_PROJECT_ID", "alumni-connect-dev"),
    ];

    #[test]
    fn applies_defaults_and_normalizes() {
        let config = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.college_domain, "college.edu");
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.event_sweep_interval_secs, 86_400);
        assert_eq!(config.cors_origins.len(), 2);
        assert!(config.admin_emails.is_empty());
        assert!(config.service_account_path.is_none());
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
    }

    #[test]
    fn parses_admin_list() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ADMIN_EMAILS", " Dean@College.edu, ,placement@college.edu "));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(
            config.admin_emails,
            vec!["dean@college.edu".to_string(), "placement@college.edu".to_string()]
        );
    }

    #[test]
    fn missing_required_variable_fails() {
        let err = AppConfig::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("FIREBASE_PROJECT_ID")));
    }

    #[test]
    fn bad_port_fails() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn zero_sweep_interval_fails() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("EVENT_SWEEP_INTERVAL_SECS", "0"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }
}
