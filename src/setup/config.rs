//! Configuration for running this bot.

use std::collections::HashSet;

use itertools::Itertools;
use poise::Framework;
use serde::Deserialize;
use serde::Serialize;
use serenity::GuildId;
use serenity::UserId;

use crate::data::ApplicationSettings;
use crate::data::TicketSettings;
use crate::error::ConfigError;
use crate::serenity;

/// The path to the config file
const CONFIG_PATH: &str = "config.toml";

/// Discord limits select menus to 25 options.
const MAX_SELECT_OPTIONS: usize = 25;

/// Support type names end up in component ids, which are limited to 100 chars.
const MAX_SUPPORT_TYPE_NAME: usize = 80;

/// Discord limits select option labels and descriptions to 100 chars.
const MAX_OPTION_TEXT: usize = 100;

/// Settings read from [CONFIG_PATH] that modify bot behavior.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Token needed to use a bot account.
    discord_token: String,

    /// See [LoggingConfig]
    logging: LoggingConfig,

    /// Useful developer specific configs.
    dev_utils: DevConfig,

    /// See [TicketSettings]
    tickets: TicketSettings,

    /// See [ApplicationSettings]
    applications: ApplicationSettings,
}

impl Config {
    /// Tries to read [CONFIG_PATH] to extract a [Config].
    /// If a file doesn't exists, create the default config file and returns error.
    /// If a file exists but is empty, re-write the default values and return error.
    /// If a file exists but is incomplete or invalid, show error and don't change files.
    pub fn read() -> Result<Config, ConfigError> {
        match std::fs::read_to_string(CONFIG_PATH) {
            Ok(content) if content.trim().is_empty() => {
                write_file(&Config::default())?;
                Err(ConfigError::InvalidConfig {
                    reason: format!("Empty config file! Rewriting {CONFIG_PATH} ..."),
                })
            }
            Ok(content) => Config::parse(&content),
            Err(file_error) if file_error.kind() == std::io::ErrorKind::NotFound => {
                write_file(&Config::default())?;
                Err(ConfigError::MissingConfig {
                    action_msg: format!("Creating {CONFIG_PATH}, fill in `discord_token`."),
                })
            }
            Err(file_error) => Err(ConfigError::IoError(file_error)),
        }
    }

    /// Deserializes and validates `content`.
    /// Deserialization errors name the path of the offending key.
    fn parse(content: &str) -> Result<Config, ConfigError> {
        let to_toml = toml::Deserializer::new(content);
        let config: Config =
            serde_path_to_error::deserialize(to_toml).map_err(|error| {
                ConfigError::InvalidConfig {
                    reason: error.to_string(),
                }
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the limits discord puts on panels, select options and component ids.
    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::InvalidConfig { reason });

        let types = &self.tickets.support_types;
        if types.is_empty() || types.len() > MAX_SELECT_OPTIONS {
            return invalid(format!(
                "tickets.support_types needs between 1 and {MAX_SELECT_OPTIONS} entries"
            ));
        }
        if let Some(bad) = types
            .iter()
            .find(|t| t.name.trim().is_empty() || t.name.chars().count() > MAX_SUPPORT_TYPE_NAME)
        {
            return invalid(format!(
                "support type name '{}' must be 1 to {MAX_SUPPORT_TYPE_NAME} chars",
                bad.name
            ));
        }
        if let Some(bad) = types
            .iter()
            .find(|t| t.description.chars().count() > MAX_OPTION_TEXT)
        {
            return invalid(format!(
                "description of support type '{}' can't exceed {MAX_OPTION_TEXT} chars",
                bad.name
            ));
        }
        if let Some(dup) = types
            .iter()
            .map(|t| t.name.to_lowercase())
            .duplicates()
            .next()
        {
            return invalid(format!("support type '{dup}' is listed twice"));
        }

        let forms = &self.applications.forms;
        if forms.is_empty() || forms.len() > MAX_SELECT_OPTIONS {
            return invalid(format!(
                "applications.forms needs between 1 and {MAX_SELECT_OPTIONS} entries"
            ));
        }
        if let Some(bad) = forms
            .iter()
            .find(|f| f.name.trim().is_empty() || f.name.chars().count() > MAX_OPTION_TEXT)
        {
            return invalid(format!(
                "form name '{}' must be 1 to {MAX_OPTION_TEXT} chars",
                bad.name
            ));
        }
        if let Some(bad) = forms
            .iter()
            .find(|f| f.description.chars().count() > MAX_OPTION_TEXT)
        {
            return invalid(format!(
                "description of form '{}' can't exceed {MAX_OPTION_TEXT} chars",
                bad.name
            ));
        }
        if let Some(empty) = forms.iter().find(|f| f.questions.is_empty()) {
            return invalid(format!("form '{}' has no questions", empty.name));
        }
        if self.applications.answer_timeout_secs == 0 {
            return invalid("applications.answer_timeout_secs can't be 0".to_string());
        }

        Ok(())
    }

    /// Basic sanity check for if a token was given.
    pub fn token(&self) -> Result<&String, ConfigError> {
        let default_token = Config::default().discord_token;
        let given_token = &self.discord_token;

        if !given_token.is_empty() && !given_token.contains(&default_token) {
            Ok(&self.discord_token)
        } else {
            Err(ConfigError::InvalidConfig {
                reason: "Missing discord token".to_string(),
            })
        }
    }

    /// Construct a bug notification notify list based on the config.
    /// Wrapper for [NotifyConfig::notify_list]
    pub fn notify_list<U, E>(&self, fw: &Framework<U, E>) -> HashSet<UserId> {
        self.dev_utils.notifications.notify_list(fw)
    }

    /// Getter for log_dir.
    pub fn log_dir(&self) -> &str {
        &self.logging.log_dir
    }

    /// Is debug mode enabled for console logs
    pub fn console_debug(&self) -> bool {
        self.logging.console_debug
    }

    /// Is file logging enabled.
    pub fn logs_enabled(&self) -> bool {
        self.logging.logs_enabled
    }

    pub fn dev_guild(&self) -> Option<GuildId> {
        self.dev_utils.dev_guild
    }

    /// Ticket settings, handed over to [Data](crate::Data).
    pub fn tickets(&self) -> &TicketSettings {
        &self.tickets
    }

    /// Application settings, handed over to [Data](crate::Data).
    pub fn applications(&self) -> &ApplicationSettings {
        &self.applications
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: "put_token_here".to_string(),

            logging: LoggingConfig {
                console_debug: false,
                logs_enabled: true,
                log_dir: "logs".to_string(),
            },

            dev_utils: DevConfig {
                dev_guild: None,
                notifications: NotifyConfig {
                    enabled: false,
                    add_owners: true,
                    userids: vec![],
                },
            },

            tickets: TicketSettings::default(),
            applications: ApplicationSettings::default(),
        }
    }
}

/// Configs for logging
#[derive(Debug, Serialize, Deserialize)]
struct LoggingConfig {
    /// Print debug traces to console?
    console_debug: bool,
    /// Enable writing to log file?
    logs_enabled: bool,
    /// Directory to store log files
    log_dir: String,
}

/// Optional configs to enable developer-specific behavior.
#[derive(Debug, Serialize, Deserialize)]
struct DevConfig {
    /// Optional guild to automatically update commands quickly.
    #[serde(with = "crate::data::opt_id", default)]
    dev_guild: Option<GuildId>,
    /// See [NotifyConfig]
    notifications: NotifyConfig,
}

/// Configs for notification behavior when encountering unexpected errors.
#[derive(Debug, Serialize, Deserialize)]
struct NotifyConfig {
    /// Enable this behavior or not. (bot sends a private message)
    enabled: bool,
    /// Whether to automatically add owners to the notify list.
    add_owners: bool,
    /// Additional users to add to the notify list.
    userids: Vec<UserId>,
}

impl NotifyConfig {
    /// Construct a bug notification notify list based on the config.
    fn notify_list<U, E>(&self, fw: &Framework<U, E>) -> HashSet<UserId> {
        if !self.enabled {
            return HashSet::new();
        }

        let owners = if self.add_owners {
            fw.options().owners.iter().copied().collect()
        } else {
            Vec::new()
        };

        owners.into_iter().chain(self.userids.iter().copied()).collect()
    }
}

/// Write the given config to [CONFIG_PATH].
fn write_file(config: &Config) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidConfig {
        reason: e.to_string(),
    })?;
    std::fs::write(CONFIG_PATH, content).map_err(ConfigError::IoError)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap()
    }

    #[test]
    fn default_config_survives_a_write() {
        let config = Config::parse(&default_toml()).unwrap();
        assert_eq!(config.tickets().support_types.len(), 4);
        assert_eq!(config.applications().forms[0].questions.len(), 12);
        assert_eq!(config.dev_guild(), None);
    }

    #[test]
    fn default_token_is_rejected() {
        let config = Config::default();
        assert!(config.token().is_err());
    }

    #[test]
    fn errors_name_the_offending_key() {
        let content = default_toml().replace("close_countdown_secs = 5", "close_countdown_secs = \"soon\"");
        let err = Config::parse(&content).unwrap_err();
        assert!(err.to_string().contains("tickets.close_countdown_secs"), "{err}");
    }

    #[test]
    fn duplicate_support_types_are_rejected() {
        let mut config = Config::default();
        let mut dup = config.tickets.support_types[0].clone();
        dup.name = dup.name.to_lowercase();
        config.tickets.support_types.push(dup);
        assert!(config.validate().is_err());
    }

    #[test]
    fn forms_need_questions() {
        let mut config = Config::default();
        config.applications.forms[0].questions.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("has no questions"));
    }

    #[test]
    fn panel_options_fit_discords_limits() {
        let mut config = Config::default();
        config.applications.forms[0].name = "x".repeat(101);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("form name"), "{err}");

        let mut config = Config::default();
        config.applications.forms[0].description = "x".repeat(101);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tickets.support_types[0].description = "x".repeat(101);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("description of support type"), "{err}");

        let mut config = Config::default();
        config.tickets.support_types[0].description = "x".repeat(100);
        assert!(config.validate().is_ok());
    }
}
