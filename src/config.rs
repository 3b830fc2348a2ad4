use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub attempt_service_url: String,
    pub upstream_timeout_secs: u64,
    pub autosave_interval_secs: u64,
    pub focus_violation_limit: Option<u32>,
    pub public_rps: u32,
    pub log_json: bool,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let autosave_interval_secs = get_env_parse_or("AUTOSAVE_INTERVAL_SECS", 30)?;
        if autosave_interval_secs == 0 {
            return Err(Error::Config(
                "AUTOSAVE_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            attempt_service_url: get_env("ATTEMPT_SERVICE_URL")?,
            upstream_timeout_secs: get_env_parse_or("UPSTREAM_TIMEOUT_SECS", 10)?,
            autosave_interval_secs,
            focus_violation_limit: get_env_parse_opt("FOCUS_VIOLATION_LIMIT")?,
            public_rps: get_env_parse_or("PUBLIC_RPS", 20)?,
            log_json: get_env_parse_or("LOG_JSON", false)?,
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

/// Tunables for a single exam session engine.
///
/// Built from [`Config`] in the binary and from [`Default`] in tests, so the
/// engine itself never reads process globals.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Countdown granularity. One tick removes one second from the clock.
    pub tick: Duration,
    pub autosave_interval: Duration,
    /// Lost-focus reports after which the attempt is submitted automatically.
    pub focus_violation_limit: Option<u32>,
    pub command_buffer: usize,
    pub notice_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            autosave_interval: Duration::from_secs(30),
            focus_violation_limit: None,
            command_buffer: 64,
            notice_capacity: 32,
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            autosave_interval: Duration::from_secs(config.autosave_interval_secs),
            focus_violation_limit: config.focus_violation_limit.filter(|limit| *limit > 0),
            ..Self::default()
        }
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_opt<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(None),
    }
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_env_parse_opt(name)?.unwrap_or(default))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            server_address: "127.0.0.1:0".into(),
            attempt_service_url: "http://localhost:9000/api/".into(),
            upstream_timeout_secs: 10,
            autosave_interval_secs: 45,
            focus_violation_limit: Some(0),
            public_rps: 20,
            log_json: false,
        }
    }

    #[test]
    fn engine_settings_follow_config() {
        let settings = EngineSettings::from_config(&sample_config());
        assert_eq!(settings.autosave_interval, Duration::from_secs(45));
        assert_eq!(settings.tick, Duration::from_secs(1));
        // a zero limit means "disabled", not "submit on first blur"
        assert_eq!(settings.focus_violation_limit, None);
    }

    #[test]
    fn default_settings_use_thirty_second_autosave() {
        let settings = EngineSettings::default();
        assert_eq!(settings.autosave_interval, Duration::from_secs(30));
        assert!(settings.focus_violation_limit.is_none());
    }
}
