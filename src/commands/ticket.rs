//! Implements the `/ticket_*` commands.
//!
//! Opening a ticket goes through a modal, closing one through a confirmation.
//! Both are answered by the component router in [crate::lib::events].

use std::sync::atomic::Ordering;

use poise::CreateReply;
use serenity::CreateInteractionResponse;
use serenity::CreateMessage;
use serenity::Mentionable;
use tracing::instrument;

use crate::lib::ticket;
use crate::lib::ticket::TicketMarker;
use crate::serenity;
use crate::ApplicationContext;
use crate::Context;
use crate::SupportError;

/// Post the ticket panel in this channel.
#[instrument(skip(ctx))]
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "MANAGE_CHANNELS"
)]
pub async fn ticket_panel(ctx: Context<'_>) -> Result<(), SupportError> {
    let (embed, menu) = ticket::panel(&ctx.data().tickets);
    let panel = CreateMessage::new().embed(embed).components(vec![menu]);
    ctx.channel_id().send_message(ctx, panel).await?;

    let reply = CreateReply::default()
        .ephemeral(true)
        .content("Ticket panel posted.");
    ctx.send(reply).await?;
    Ok(())
}

/// Open a support ticket.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only)]
pub async fn ticket_open(
    ctx: ApplicationContext<'_>,
    #[description = "What you need help with"]
    #[autocomplete = "autocomplete_support_type"]
    category: String,
) -> Result<(), SupportError> {
    let app_ctx = ctx;
    let ctx = Context::from(app_ctx);

    let settings = &ctx.data().tickets;
    let support_type = settings.support_type(&category)?;
    let modal = ticket::reason_modal(settings, support_type);

    app_ctx
        .interaction
        .create_response(ctx, CreateInteractionResponse::Modal(modal))
        .await?;
    // Poise would otherwise try to answer the interaction a second time on errors.
    app_ctx
        .has_sent_initial_response
        .store(true, Ordering::SeqCst);
    Ok(())
}

/// Support types starting with what was typed so far.
async fn autocomplete_support_type(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let partial = partial.trim().to_lowercase();
    ctx.data()
        .tickets
        .support_types
        .iter()
        .filter(|t| t.name.to_lowercase().starts_with(&partial))
        .map(|t| t.name.clone())
        .collect()
}

/// Close this ticket.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only)]
pub async fn ticket_close(ctx: Context<'_>) -> Result<(), SupportError> {
    TicketMarker::fetch(ctx.serenity_context(), ctx.channel_id()).await?;

    let reply = CreateReply::default()
        .ephemeral(true)
        .content("Are you sure you want to close this ticket?")
        .components(vec![ticket::confirm_close_buttons()]);
    ctx.send(reply).await?;
    Ok(())
}

/// Add a member to this ticket.
#[instrument(skip(ctx, member), fields(member = %member.name))]
#[poise::command(slash_command, guild_only)]
pub async fn ticket_add(
    ctx: Context<'_>,
    #[description = "Member to add"] member: serenity::User,
) -> Result<(), SupportError> {
    let (channel, _) = TicketMarker::fetch(ctx.serenity_context(), ctx.channel_id()).await?;
    ticket::add_member(ctx.serenity_context(), channel.id, member.id).await?;
    tracing::info!("Added {} to {}.", member.name, channel.name);

    let reply = CreateReply::default()
        .ephemeral(true)
        .content(format!("{} has been added to the ticket.", member.mention()));
    ctx.send(reply).await?;
    Ok(())
}

/// Remove a member from this ticket.
#[instrument(skip(ctx, member), fields(member = %member.name))]
#[poise::command(slash_command, guild_only)]
pub async fn ticket_remove(
    ctx: Context<'_>,
    #[description = "Member to remove"] member: serenity::User,
) -> Result<(), SupportError> {
    let (channel, _) = TicketMarker::fetch(ctx.serenity_context(), ctx.channel_id()).await?;
    ticket::remove_member(ctx.serenity_context(), &channel, member.id).await?;
    tracing::info!("Removed {} from {}.", member.name, channel.name);

    let reply = CreateReply::default()
        .ephemeral(true)
        .content(format!("{} has been removed from the ticket.", member.mention()));
    ctx.send(reply).await?;
    Ok(())
}
