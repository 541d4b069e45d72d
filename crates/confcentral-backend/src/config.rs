use std::{env, fmt::Display, net::IpAddr, str::FromStr, time::Duration};

use confcentral::log::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Application id; names the sender domain of outbound mail.
    pub app_id: String,
    pub announcement_interval: Duration,
    pub task_concurrency: usize,
    pub task_max_attempts: u32,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let interval_secs: u64 = try_load(&lookup, "CONF_ANNOUNCEMENT_INTERVAL_SECS", "3600")?;
        let task_concurrency: usize = try_load(&lookup, "CONF_TASK_CONCURRENCY", "4")?;
        let task_max_attempts: u32 = try_load(&lookup, "CONF_TASK_MAX_ATTEMPTS", "5")?;

        if interval_secs == 0 {
            return Err(invalid("CONF_ANNOUNCEMENT_INTERVAL_SECS", "0", "must be positive"));
        }
        if task_concurrency == 0 {
            return Err(invalid("CONF_TASK_CONCURRENCY", "0", "must be positive"));
        }
        if task_max_attempts == 0 {
            return Err(invalid("CONF_TASK_MAX_ATTEMPTS", "0", "must be positive"));
        }

        Ok(Self {
            host: try_load(&lookup, "CONF_HOST", "127.0.0.1")?,
            port: try_load(&lookup, "CONF_PORT", "3030")?,
            app_id: try_load(&lookup, "CONF_APP_ID", "conference-central")?,
            announcement_interval: Duration::from_secs(interval_secs),
            task_concurrency,
            task_max_attempts,
            allowed_origins: lookup("CONF_ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_else(default_origins),
        })
    }

    pub fn sender_address(&self) -> String {
        format!("noreply@{}.appspotmail.com", self.app_id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3030,
            app_id: "conference-central".to_string(),
            announcement_interval: Duration::from_secs(3600),
            task_concurrency: 4,
            task_max_attempts: 5,
            allowed_origins: default_origins(),
        }
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Display) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim().parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        invalid(key, &raw, e)
    })
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_origins() -> Vec<String> {
    if cfg!(debug_assertions) {
        let dev_ports = [3000, 8000, 8080, 8081, 5173];
        dev_ports
            .iter()
            .flat_map(|port| {
                [
                    format!("http://localhost:{port}"),
                    format!("http://127.0.0.1:{port}"),
                ]
            })
            .collect()
    } else {
        // Production origins come from CONF_ALLOWED_ORIGINS
        Vec::new()
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
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3030);
        assert_eq!(config.host, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(config.app_id, "conference-central");
        assert_eq!(config.announcement_interval, Duration::from_secs(3600));
        assert_eq!(config.task_concurrency, 4);
        assert_eq!(config.task_max_attempts, 5);
        assert_eq!(
            config.sender_address(),
            "noreply@conference-central.appspotmail.com"
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("CONF_HOST", "0.0.0.0"),
            ("CONF_PORT", "8088"),
            ("CONF_APP_ID", "confs"),
            ("CONF_ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
        ]))
        .unwrap();
        assert_eq!(config.host, IpAddr::from([0, 0, 0, 0]));
        assert_eq!(config.port, 8088);
        assert_eq!(config.sender_address(), "noreply@confs.appspotmail.com");
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = Config::from_lookup(lookup(&[("CONF_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CONF_PORT", .. }));

        let err = Config::from_lookup(lookup(&[("CONF_TASK_CONCURRENCY", "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "CONF_TASK_CONCURRENCY",
                ..
            }
        ));
    }
}
