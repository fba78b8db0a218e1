//! Event handling
//!
//! Slash commands are dispatched by poise. Everything users click or submit arrives
//! here instead and is routed by its [ComponentId].

use serenity::ComponentInteraction;
use serenity::ComponentInteractionDataKind;
use serenity::CreateInteractionResponse;
use serenity::CreateInteractionResponseFollowup;
use serenity::CreateInteractionResponseMessage;
use serenity::CreateMessage;
use serenity::EditInteractionResponse;
use serenity::Interaction;
use serenity::Mentionable;
use serenity::ModalInteraction;
use serenity::UserId;
use tracing::instrument;

use super::application;
use super::custom_id::ComponentId;
use super::custom_id::Verdict;
use super::ticket;
use super::ticket::TicketMarker;
use crate::error::UserError;
use crate::serenity;
use crate::Data;
use crate::SupportError;

/// Entry point for every gateway event the framework doesn't consume.
pub async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, SupportError>,
    data: &Data,
) -> Result<(), SupportError> {
    let serenity::FullEvent::InteractionCreate { interaction } = event else {
        return Ok(());
    };

    match interaction {
        Interaction::Component(component) => {
            let result = handle_component(ctx, data, component).await;
            Responder::Component(component).finish(ctx, result).await
        }
        Interaction::Modal(modal) => {
            let result = handle_modal(ctx, data, modal).await;
            Responder::Modal(modal).finish(ctx, result).await
        }
        // Commands and autocompletes belong to poise.
        _ => Ok(()),
    }
}

/// Routes button presses and select menu choices.
#[instrument(skip_all, fields(id = %component.data.custom_id, user = %component.user.name))]
async fn handle_component(
    ctx: &serenity::Context,
    data: &Data,
    component: &ComponentInteraction,
) -> Result<(), SupportError> {
    let id: ComponentId = component.data.custom_id.parse()?;
    tracing::debug!("Routing component {id:?}.");

    match id {
        ComponentId::TicketPanel => {
            let choice = selected(component).ok_or(UserError::BadArgs { input: None })?;
            let support_type = data.tickets.support_type(&choice)?;
            let modal = ticket::reason_modal(&data.tickets, support_type);
            component
                .create_response(ctx, CreateInteractionResponse::Modal(modal))
                .await?;
        }
        ComponentId::CloseTicket => {
            TicketMarker::fetch(ctx, component.channel_id).await?;
            let confirmation = CreateInteractionResponseMessage::new()
                .content("Are you sure you want to close this ticket?")
                .components(vec![ticket::confirm_close_buttons()])
                .ephemeral(true);
            component
                .create_response(ctx, CreateInteractionResponse::Message(confirmation))
                .await?;
        }
        ComponentId::ConfirmClose => confirm_close(ctx, data, component).await?,
        ComponentId::CancelClose => {
            let cancelled = CreateInteractionResponseMessage::new()
                .content("Ticket closure cancelled.")
                .components(Vec::new());
            component
                .create_response(ctx, CreateInteractionResponse::UpdateMessage(cancelled))
                .await?;
        }
        ComponentId::ClaimTicket => claim(ctx, data, component).await?,
        ComponentId::ApplicationPanel => start_application(ctx, data, component).await?,
        ComponentId::Decide { verdict, applicant } => {
            let modal = application::decision_modal(verdict, applicant);
            component
                .create_response(ctx, CreateInteractionResponse::Modal(modal))
                .await?;
        }
        ComponentId::TicketModal { .. } | ComponentId::DecisionModal { .. } => {
            Err(SupportError::MalformedCustomId(component.data.custom_id.clone()))?
        }
    }

    Ok(())
}

/// Routes modal submissions.
#[instrument(skip_all, fields(id = %modal.data.custom_id, user = %modal.user.name))]
async fn handle_modal(
    ctx: &serenity::Context,
    data: &Data,
    modal: &ModalInteraction,
) -> Result<(), SupportError> {
    let id: ComponentId = modal.data.custom_id.parse()?;
    tracing::debug!("Routing modal {id:?}.");

    match id {
        ComponentId::TicketModal { support_type } => {
            let guild_id = modal.guild_id.ok_or(UserError::GuildOnly)?;
            let support_type = data.tickets.support_type(&support_type)?;
            let reason = input_value(modal, ticket::REASON_INPUT).unwrap_or_default();

            // Creating the category and channel can take longer than discord waits.
            modal.defer_ephemeral(ctx).await?;
            let channel =
                ticket::open(ctx, &data.tickets, guild_id, &modal.user, support_type, &reason)
                    .await?;

            let created = format!("Ticket created: {}", channel.id.mention());
            modal
                .edit_response(ctx, EditInteractionResponse::new().content(created))
                .await?;
        }
        ComponentId::DecisionModal { verdict, applicant } => {
            let message = modal
                .message
                .as_deref()
                .ok_or_else(|| SupportError::MalformedCustomId(modal.data.custom_id.clone()))?;

            if !data.decided.begin(message.id).await {
                Err(UserError::AlreadyDecided)?
            }
            let result = submit_decision(ctx, data, modal, message, verdict, applicant).await;
            data.decided.end(&message.id).await;
            result?;
        }
        _ => Err(SupportError::MalformedCustomId(modal.data.custom_id.clone()))?,
    }

    Ok(())
}

/// Removes the Accept/Deny buttons and carries out the decision.
/// Only one submission per message gets past the buttons check.
async fn submit_decision(
    ctx: &serenity::Context,
    data: &Data,
    modal: &ModalInteraction,
    message: &serenity::Message,
    verdict: Verdict,
    applicant: UserId,
) -> Result<(), SupportError> {
    // The copy attached to the modal predates any earlier decision.
    let current = message.channel_id.message(ctx, message.id).await?;
    if current.components.is_empty() {
        Err(UserError::AlreadyDecided)?
    }

    let reason = input_value(modal, application::DECISION_INPUT).unwrap_or_default();
    let decided = CreateInteractionResponseMessage::new().components(Vec::new());
    modal
        .create_response(ctx, CreateInteractionResponse::UpdateMessage(decided))
        .await?;

    application::decide(ctx, data, &modal.user, verdict, applicant, &reason).await
}

/// Announces the countdown, then closes the ticket.
/// A second confirmation while the countdown runs is refused.
async fn confirm_close(
    ctx: &serenity::Context,
    data: &Data,
    component: &ComponentInteraction,
) -> Result<(), SupportError> {
    let (channel, marker) = TicketMarker::fetch(ctx, component.channel_id).await?;

    if !data.closing.begin(channel.id).await {
        Err(UserError::CloseAlreadyPending)?
    }
    let result = close_confirmed(ctx, data, component, &channel, &marker).await;
    data.closing.end(&channel.id).await;
    result
}

async fn close_confirmed(
    ctx: &serenity::Context,
    data: &Data,
    component: &ComponentInteraction,
    channel: &serenity::GuildChannel,
    marker: &TicketMarker,
) -> Result<(), SupportError> {
    let closed = CreateInteractionResponseMessage::new()
        .content("Ticket closed.")
        .components(Vec::new());
    component
        .create_response(ctx, CreateInteractionResponse::UpdateMessage(closed))
        .await?;

    let countdown = super::format_duration(&data.tickets.close_countdown());
    channel
        .id
        .say(
            ctx,
            format!(
                "This ticket will be deleted in {countdown}. Closed by {}.",
                component.user.mention()
            ),
        )
        .await?;

    ticket::close(ctx, &data.tickets, channel, marker).await
}

/// Claims a ticket for the staff member that pressed the button.
async fn claim(
    ctx: &serenity::Context,
    data: &Data,
    component: &ComponentInteraction,
) -> Result<(), SupportError> {
    let (channel, marker) = TicketMarker::fetch(ctx, component.channel_id).await?;

    // A support type removed from the config leaves only managers able to claim.
    let role = data
        .tickets
        .support_type(&marker.support_type)
        .ok()
        .and_then(|t| t.role);
    let member = component.member.as_ref().ok_or(UserError::GuildOnly)?;
    let claimer = ticket::Claimer {
        id: component.user.id,
        roles: &member.roles,
        permissions: member.permissions,
    };
    ticket::check_claim(claimer, &marker, role)?;

    let claimed = CreateInteractionResponseMessage::new().components(vec![ticket::claimed_buttons()]);
    component
        .create_response(ctx, CreateInteractionResponse::UpdateMessage(claimed))
        .await?;
    channel
        .id
        .say(ctx, format!("Ticket claimed by {}", component.user.mention()))
        .await?;

    tracing::info!("{} claimed {}.", component.user.name, channel.name);
    Ok(())
}

/// Starts the DM interview for the chosen form.
async fn start_application(
    ctx: &serenity::Context,
    data: &Data,
    component: &ComponentInteraction,
) -> Result<(), SupportError> {
    let index: usize = selected(component)
        .and_then(|value| value.parse().ok())
        .ok_or(UserError::UnknownForm)?;
    let form = data.applications.form(index)?;
    data.response_channel().await?;

    let timeout = super::format_duration(&data.applications.answer_timeout());
    let started = CreateInteractionResponseMessage::new()
        .content(format!(
            "Check your direct messages to start '{}'. You have {timeout} to answer each question.",
            form.name
        ))
        .ephemeral(true);
    component
        .create_response(ctx, CreateInteractionResponse::Message(started))
        .await?;

    if let Err(e) = application::apply(ctx, data, &component.user, form).await {
        tracing::warn!("Application of {} failed. {e}", component.user.name);

        let cancelled = CreateMessage::new().content(application::CANCELLED);
        if let Err(e) = component.user.direct_message(ctx, cancelled).await {
            tracing::debug!("Couldn't send cancellation to {}. {e}", component.user.name);
        }

        // The interaction token may have expired during a long interview.
        let followup = CreateInteractionResponseFollowup::new()
            .content("I couldn't finish your application. Make sure your direct messages are open and try again.")
            .ephemeral(true);
        if let Err(e) = component.create_followup(ctx, followup).await {
            tracing::debug!("Couldn't send followup to {}. {e}", component.user.name);
        }
    }

    Ok(())
}

/// The first value picked in a string select menu.
fn selected(component: &ComponentInteraction) -> Option<String> {
    match &component.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => values.first().cloned(),
        _ => None,
    }
}

/// The value typed into the input named `custom_id`.
fn input_value(modal: &ModalInteraction, custom_id: &str) -> Option<String> {
    modal
        .data
        .components
        .iter()
        .flat_map(|row| &row.components)
        .find_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) if input.custom_id == custom_id => {
                input.value.clone()
            }
            _ => None,
        })
}

/// The interaction an outcome is reported on.
enum Responder<'a> {
    Component(&'a ComponentInteraction),
    Modal(&'a ModalInteraction),
}

impl Responder<'_> {
    /// Reports the outcome of a handler.
    /// User errors are answered and swallowed, anything else is answered and passed on.
    async fn finish(
        &self,
        ctx: &serenity::Context,
        result: Result<(), SupportError>,
    ) -> Result<(), SupportError> {
        match result {
            Ok(()) => Ok(()),
            Err(SupportError::UserError(user_error)) => {
                tracing::debug!("{user_error}");
                self.ephemeral(ctx, user_error.to_string()).await;
                Ok(())
            }
            Err(error) => {
                self.ephemeral(ctx, "Something went wrong... A bug report has been sent.")
                    .await;
                Err(error)
            }
        }
    }

    fn custom_id(&self) -> &str {
        match self {
            Responder::Component(i) => &i.data.custom_id,
            Responder::Modal(i) => &i.data.custom_id,
        }
    }

    /// Replies ephemerally.
    /// If the interaction was already answered the reply goes where [Fallback] says.
    async fn ephemeral(&self, ctx: &serenity::Context, content: impl Into<String>) {
        let content = content.into();
        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(&content)
                .ephemeral(true),
        );

        let answered = match self {
            Responder::Component(i) => i.create_response(ctx, response).await,
            Responder::Modal(i) => i.create_response(ctx, response).await,
        };
        if answered.is_ok() {
            return;
        }

        let result = match Fallback::for_custom_id(self.custom_id()) {
            Fallback::EditDeferred => {
                let edit = EditInteractionResponse::new().content(&content);
                match self {
                    Responder::Component(i) => i.edit_response(ctx, edit).await.map(|_| ()),
                    Responder::Modal(i) => i.edit_response(ctx, edit).await.map(|_| ()),
                }
            }
            Fallback::Followup => {
                let followup = CreateInteractionResponseFollowup::new()
                    .content(&content)
                    .ephemeral(true);
                match self {
                    Responder::Component(i) => i.create_followup(ctx, followup).await.map(|_| ()),
                    Responder::Modal(i) => i.create_followup(ctx, followup).await.map(|_| ()),
                }
            }
        };

        if let Err(e) = result {
            tracing::error!("Failed to send ephemeral reply. {e}")
        }
    }
}

/// Where a reply goes once the interaction has been answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fallback {
    /// The only response so far is an ephemeral defer, so editing it is private.
    EditDeferred,
    /// The response may be a public message, which must not be overwritten.
    Followup,
}

impl Fallback {
    fn for_custom_id(custom_id: &str) -> Self {
        match custom_id.parse::<ComponentId>() {
            Ok(ComponentId::TicketModal { .. }) => Fallback::EditDeferred,
            _ => Fallback::Followup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_ticket_modal_edits_its_response() {
        let ticket_modal = ComponentId::TicketModal {
            support_type: "General Support".to_string(),
        };
        assert_eq!(
            Fallback::for_custom_id(&ticket_modal.to_string()),
            Fallback::EditDeferred
        );
    }

    #[test]
    fn public_updates_get_a_followup() {
        let applicant = UserId::new(7);
        let answered_publicly = [
            ComponentId::ClaimTicket,
            ComponentId::ConfirmClose,
            ComponentId::CancelClose,
            ComponentId::DecisionModal {
                verdict: Verdict::Accepted,
                applicant,
            },
            ComponentId::Decide {
                verdict: Verdict::Denied,
                applicant,
            },
        ];

        for id in answered_publicly {
            assert_eq!(
                Fallback::for_custom_id(&id.to_string()),
                Fallback::Followup,
                "{id:?}"
            );
        }
        assert_eq!(Fallback::for_custom_id("not-ours"), Fallback::Followup);
    }
}
