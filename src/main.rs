//! A Discord support bot: ticket channels and direct message applications.

mod commands;
mod data;
mod error;
mod lib;
mod log;
mod setup;

pub use poise::serenity_prelude as serenity;

use data::Data;
use error::SupportError;
use setup::Config;

/// Convenient type alias for [poise::Context].
pub type Context<'a> = poise::Context<'a, Data, SupportError>;

/// Context of slash commands that answer with a modal.
pub type ApplicationContext<'a> = poise::ApplicationContext<'a, Data, SupportError>;

#[tokio::main]
async fn main() -> Result<(), SupportError> {
    let config = Config::read()?;

    // Keep the guard alive, otherwise file logs stop being flushed.
    let _guard = log::install_tracing(&config);

    let mut client = setup::client(config).await?;
    client.start().await?;

    Ok(())
}
