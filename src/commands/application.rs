//! Implements the `/app_panel` and `/set_app_channel` commands.

use poise::CreateReply;
use serenity::CreateEmbed;
use serenity::Mentionable;
use tracing::instrument;

use crate::lib::application;
use crate::lib::embeds;
use crate::serenity;
use crate::Context;
use crate::SupportError;

/// Apply for a position.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only)]
pub async fn app_panel(ctx: Context<'_>) -> Result<(), SupportError> {
    let embed = CreateEmbed::new()
        .title("Apply for a Position")
        .description("Select an application from the menu below.")
        .colour(embeds::BLUE);

    let reply = CreateReply::default()
        .ephemeral(true)
        .embed(embed)
        .components(vec![application::panel_menu(&ctx.data().applications)]);
    ctx.send(reply).await?;
    Ok(())
}

/// Set the channel applications are sent to.
#[instrument(skip(ctx, channel), fields(channel = %channel.name))]
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn set_app_channel(
    ctx: Context<'_>,
    #[description = "Channel for application responses"]
    #[channel_types("Text")]
    channel: serenity::GuildChannel,
) -> Result<(), SupportError> {
    ctx.data().set_response_channel(channel.id).await;
    tracing::info!("Application responses now go to {}.", channel.name);

    let reply = CreateReply::default().ephemeral(true).content(format!(
        "Application responses will be sent to {}.",
        channel.id.mention()
    ));
    ctx.send(reply).await?;
    Ok(())
}
