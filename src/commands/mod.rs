//! Bot commands.

mod application;
mod ticket;

use crate::{Data, SupportError};

/// Convenient type alias for [poise::Command].
pub type Command = poise::Command<Data, SupportError>;

/// Lists all the implemented commands
pub fn list() -> Vec<Command> {
    vec![
        ticket::ticket_panel(),
        ticket::ticket_open(),
        ticket::ticket_close(),
        ticket::ticket_add(),
        ticket::ticket_remove(),
        application::app_panel(),
        application::set_app_channel(),
    ]
}
