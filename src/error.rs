//! Error types.
//!
//! [SupportError] is the crate-wide error. [UserError] is shown to the user that
//! caused it, everything else is treated as a bug.

use thiserror::Error;

use crate::serenity;

/// Any error produced by this bot.
#[derive(Error, Debug)]
pub enum SupportError {
    #[error(transparent)]
    UserError(#[from] UserError),

    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    #[error("Serenity error: {0}")]
    Serenity(#[from] serenity::Error),

    #[error("Command panicked: {}", .payload.as_deref().unwrap_or("<no payload>"))]
    Panic { payload: Option<String> },

    #[error("Command structure mismatch: {description}")]
    CommandStructureMismatch { description: String },

    #[error("Malformed component id: '{0}'")]
    MalformedCustomId(String),
}

/// Errors caused by user input. These are replied to and logged at debug level.
#[derive(Error, Debug)]
pub enum UserError {
    #[error("This only works in a server.")]
    GuildOnly,

    #[error("This channel is not a ticket.")]
    NotTicketChannel,

    #[error("Unknown support type '{name}'. Choose one of: {known}.")]
    UnknownSupportType { name: String, known: String },

    #[error("Unknown application.")]
    UnknownForm,

    #[error("You already have an open ticket: <#{channel}>")]
    TicketAlreadyOpen { channel: serenity::ChannelId },

    #[error("Only staff of this ticket's support type can claim it.")]
    CannotClaim,

    #[error("You can't claim your own ticket.")]
    CannotClaimOwnTicket,

    #[error("This ticket is already closing.")]
    CloseAlreadyPending,

    #[error("The ticket owner can't be removed from their own ticket.")]
    CannotRemoveOwner,

    #[error("Application response channel is not set.")]
    ResponseChannelUnset,

    #[error("This application has already been decided.")]
    AlreadyDecided,

    #[error("Couldn't understand '{}'.", .input.as_deref().unwrap_or_default())]
    BadArgs { input: Option<String> },
}

/// Errors while reading `config.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No config file found. {action_msg}")]
    MissingConfig { action_msg: String },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Config io error: {0}")]
    IoError(#[from] std::io::Error),
}
