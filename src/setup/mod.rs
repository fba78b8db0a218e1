//! Builds the client and framework.

mod config;
mod framework;

use crate::serenity;
use crate::SupportError;

pub use config::Config;

/// Constructs a [serenity::Client] running the [poise::Framework].
pub(super) async fn client(config: Config) -> Result<serenity::Client, SupportError> {
    // Get discord token from config file
    let token = config.token()?.clone();

    // Intents we wish to use
    // See https://discord.com/developers/docs/topics/gateway#gateway-intents
    // Message content is needed to read application answers and write transcripts.
    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    let client = serenity::ClientBuilder::new(token, intents)
        .framework(framework::framework(config))
        .await?;

    Ok(client)
}
