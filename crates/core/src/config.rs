//! Process configuration, built once at startup and passed by reference.

use std::path::PathBuf;

/// Parse an environment variable with a default fallback.
///
/// Missing variables return `default` silently (the expected case); set but
/// unparseable values log a warning instead of being swallowed.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    match std::env::var(var) {
        Ok(v) => match v.parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

/// Credentials for the external backup channel.
#[derive(Clone)]
pub struct ChannelConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("bot_token", &"***")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Startup configuration for resolver, store, and backup controller.
#[derive(Debug, Clone)]
pub struct Config {
    /// Primary remote database; `None` or unreachable falls back to SQLite.
    pub database_url: Option<String>,
    /// Candidate directories for the SQLite file, in priority order.
    pub data_dirs: Vec<PathBuf>,
    /// Backup channel credentials; `None` disables restore and export.
    pub channel: Option<ChannelConfig>,
    /// Daily export target, local wall-clock hour.
    pub backup_hour: u32,
    /// Daily export target, local wall-clock minute.
    pub backup_minute: u32,
}

impl Config {
    /// Reads configuration from the environment.
    ///
    /// `DATABASE_URL` selects the primary backend; `VITALOG_DATA_DIR`
    /// prepends a SQLite location ahead of the built-in candidates;
    /// `VITALOG_BOT_TOKEN` + `VITALOG_CHAT_ID` enable the backup channel;
    /// `VITALOG_BACKUP_HOUR`/`VITALOG_BACKUP_MINUTE` set the daily export
    /// time (default 21:00).
    #[must_use]
    pub fn from_env() -> Self {
        let mut data_dirs = Vec::new();
        if let Ok(dir) = std::env::var("VITALOG_DATA_DIR") {
            if !dir.is_empty() {
                data_dirs.push(PathBuf::from(dir));
            }
        }
        data_dirs.extend(Self::default_data_dirs());

        let channel = match (
            std::env::var("VITALOG_BOT_TOKEN"),
            std::env::var("VITALOG_CHAT_ID"),
        ) {
            (Ok(bot_token), Ok(chat_id)) if !bot_token.is_empty() && !chat_id.is_empty() => {
                Some(ChannelConfig { bot_token, chat_id })
            }
            _ => None,
        };

        Self {
            database_url: std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()),
            data_dirs,
            channel,
            backup_hour: env_parse_with_default("VITALOG_BACKUP_HOUR", 21),
            backup_minute: env_parse_with_default("VITALOG_BACKUP_MINUTE", 0),
        }
    }

    fn default_data_dirs() -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(base) = dirs::data_local_dir() {
            dirs.push(base.join("vitalog"));
        }
        dirs.push(PathBuf::from("."));
        dirs.push(std::env::temp_dir().join("vitalog"));
        dirs
    }
}
