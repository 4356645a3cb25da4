use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub max_upload_mb: usize,

    // Storage
    pub upload_dir: PathBuf,

    // Translation provider
    pub translate_api_url: String,
    pub default_source_language: String,

    // Jobs
    pub max_concurrent_jobs: usize,
    pub job_retention_hours: i64,
    pub sweep_schedule: String,
}

pub const DEFAULT_TRANSLATE_API_URL: &str = "https://translate.googleapis.com/translate_a/single";

impl Config {
    pub fn from_env() -> Self {
        Self {
            // Server
            port: parse_env("PORT", 5000),
            max_upload_mb: parse_env("MAX_UPLOAD_MB", 512),

            // Storage
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),

            // Translation provider
            translate_api_url: std::env::var("TRANSLATE_API_URL")
                .unwrap_or_else(|_| DEFAULT_TRANSLATE_API_URL.to_string()),
            default_source_language: std::env::var("DEFAULT_SOURCE_LANGUAGE")
                .unwrap_or_else(|_| "it".to_string()),

            // Jobs
            max_concurrent_jobs: parse_env::<usize>("MAX_CONCURRENT_JOBS", 4).max(1),
            job_retention_hours: parse_env("JOB_RETENTION_HOURS", 24),
            sweep_schedule: std::env::var("SWEEP_SCHEDULE")
                .unwrap_or_else(|_| "0 0 * * * *".to_string()),
        }
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::hours(self.job_retention_hours)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 8] = [
        "PORT",
        "MAX_UPLOAD_MB",
        "UPLOAD_DIR",
        "TRANSLATE_API_URL",
        "DEFAULT_SOURCE_LANGUAGE",
        "MAX_CONCURRENT_JOBS",
        "JOB_RETENTION_HOURS",
        "SWEEP_SCHEDULE",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env();

        assert_eq!(config.port, 5000);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.translate_api_url, DEFAULT_TRANSLATE_API_URL);
        assert_eq!(config.default_source_language, "it");
        assert_eq!(config.max_concurrent_jobs, 4);
        assert_eq!(config.job_retention_hours, 24);
        assert_eq!(config.sweep_schedule, "0 0 * * * *");
        assert_eq!(config.retention(), chrono::Duration::hours(24));
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("PORT", "8081");
        std::env::set_var("UPLOAD_DIR", "/tmp/jobs");
        std::env::set_var("DEFAULT_SOURCE_LANGUAGE", "ja");
        std::env::set_var("JOB_RETENTION_HOURS", "2");

        let config = Config::from_env();
        clear_env();

        assert_eq!(config.port, 8081);
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/jobs"));
        assert_eq!(config.default_source_language, "ja");
        assert_eq!(config.retention(), chrono::Duration::hours(2));
    }

    #[test]
    #[serial]
    fn test_invalid_numbers_fall_back_to_defaults() {
        clear_env();
        std::env::set_var("PORT", "not-a-port");
        std::env::set_var("MAX_CONCURRENT_JOBS", "0");

        let config = Config::from_env();
        clear_env();

        assert_eq!(config.port, 5000);
        assert_eq!(config.max_concurrent_jobs, 1);
    }
}
