//! Applications: the DM interview, the submission and staff decisions.

use serenity::ButtonStyle;
use serenity::CreateActionRow;
use serenity::CreateButton;
use serenity::CreateEmbed;
use serenity::CreateEmbedFooter;
use serenity::CreateInputText;
use serenity::CreateMessage;
use serenity::CreateModal;
use serenity::CreateSelectMenu;
use serenity::CreateSelectMenuKind;
use serenity::CreateSelectMenuOption;
use serenity::InputTextStyle;
use serenity::Mentionable;
use serenity::User;
use serenity::UserId;
use tracing::instrument;

use super::custom_id::ComponentId;
use super::custom_id::Verdict;
use super::embeds;
use super::interview;
use super::interview::Answer;
use super::interview::Conversation;
use super::interview::DirectMessages;
use super::interview::Outcome;
use crate::data::ApplicationForm;
use crate::data::ApplicationSettings;
use crate::error::SupportError;
use crate::serenity;
use crate::Data;

/// Custom id of the reason input in the decision modal.
pub const DECISION_INPUT: &str = "decision_reason";

/// Sent when an interview doesn't finish.
pub const CANCELLED: &str = "Application process cancelled or an error occurred.";

/// Select menu listing every form, valued by index.
pub fn panel_menu(settings: &ApplicationSettings) -> CreateActionRow {
    let options = settings
        .forms
        .iter()
        .enumerate()
        .map(|(index, form)| {
            let option = CreateSelectMenuOption::new(&form.name, index.to_string());
            match form.description.is_empty() {
                true => option,
                false => option.description(&form.description),
            }
        })
        .collect();
    let menu = CreateSelectMenu::new(
        ComponentId::ApplicationPanel.to_string(),
        CreateSelectMenuKind::String { options },
    )
    .placeholder("Select an application...")
    .min_values(1)
    .max_values(1);

    CreateActionRow::SelectMenu(menu)
}

/// The embeds of a submitted application, starting with the applicant.
fn submission_embeds(form: &ApplicationForm, applicant: UserId, answers: &[Answer]) -> Vec<CreateEmbed> {
    let title = format!("New Application: {}", form.name);
    let header = CreateEmbed::new().title(&title).colour(embeds::GREEN);
    let continued = || {
        CreateEmbed::new()
            .title(format!("{title} (continued)"))
            .colour(embeds::GREEN)
    };

    let user = embeds::field("User", &applicant.mention().to_string(), false);
    let answers = answers.iter().enumerate().map(|(i, a)| {
        let question = format!("Q{}: {}", i + 1, a.question);
        embeds::field(&question, &a.answer, false)
    });

    embeds::chunk_fields(header, continued, std::iter::once(user).chain(answers).collect())
}

/// The "Accept" and "Deny" buttons of a submission.
fn decision_buttons(applicant: UserId) -> CreateActionRow {
    let button = |verdict: Verdict, label: &str, style: ButtonStyle| {
        CreateButton::new(ComponentId::Decide { verdict, applicant }.to_string())
            .label(label)
            .style(style)
    };

    CreateActionRow::Buttons(vec![
        button(Verdict::Accepted, "Accept", ButtonStyle::Success),
        button(Verdict::Denied, "Deny", ButtonStyle::Danger),
    ])
}

/// The modal asking staff why they decided so.
pub fn decision_modal(verdict: Verdict, applicant: UserId) -> CreateModal {
    let reason = CreateInputText::new(InputTextStyle::Paragraph, "Reason for decision", DECISION_INPUT)
        .placeholder("Enter the reason...")
        .max_length(embeds::FIELD_VALUE_LIMIT as u16)
        .required(true);

    CreateModal::new(
        ComponentId::DecisionModal { verdict, applicant }.to_string(),
        format!("{verdict} Application"),
    )
    .components(vec![CreateActionRow::InputText(reason)])
}

/// Interviews `applicant` over direct messages and posts the answers to the response channel.
#[instrument(skip_all, fields(applicant = %applicant.name, form = %form.name))]
pub async fn apply(
    ctx: &serenity::Context,
    data: &Data,
    applicant: &User,
    form: &ApplicationForm,
) -> Result<(), SupportError> {
    let mut dms = DirectMessages::open(ctx, applicant.id).await?;
    let timeout = data.applications.answer_timeout();

    let answers = match interview::run(&mut dms, form, timeout).await? {
        Outcome::Completed(answers) => answers,
        Outcome::TimedOut { answered } => {
            tracing::info!(
                "Application timed out after {answered} of {} answers.",
                form.questions.len()
            );
            dms.say(CANCELLED.to_string()).await?;
            return Ok(());
        }
    };

    // The channel may have been unset or deleted during the interview.
    let channel = match data.response_channel().await {
        Ok(channel) => channel.to_channel(ctx).await.ok().map(|_| channel),
        Err(_) => None,
    };
    let Some(channel) = channel else {
        tracing::warn!("Application response channel not found.");
        dms.say("Application response channel not found.".to_string())
            .await?;
        return Ok(());
    };

    let submission = CreateMessage::new()
        .embeds(submission_embeds(form, applicant.id, &answers))
        .components(vec![decision_buttons(applicant.id)]);
    channel.send_message(ctx, submission).await?;
    tracing::info!("Application submitted.");

    dms.say("Your application has been submitted successfully!".to_string())
        .await?;
    Ok(())
}

/// Tells the applicant about a decision and logs it in the response channel.
#[instrument(skip(ctx, data, reviewer, reason), fields(reviewer = %reviewer.name))]
pub async fn decide(
    ctx: &serenity::Context,
    data: &Data,
    reviewer: &User,
    verdict: Verdict,
    applicant: UserId,
    reason: &str,
) -> Result<(), SupportError> {
    let notice = CreateMessage::new().content(format!(
        "Your application has been {verdict}.\nReason: {reason}"
    ));
    let notified = match applicant.direct_message(ctx, notice).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Couldn't tell applicant {applicant} about the decision. {e}");
            false
        }
    };

    let mut embed = CreateEmbed::new()
        .title(format!("Application {verdict}"))
        .colour(verdict.colour())
        .field("User", applicant.mention().to_string(), true)
        .field("Reviewer", reviewer.mention().to_string(), true)
        .field(
            "Reason",
            embeds::truncate(reason, embeds::FIELD_VALUE_LIMIT),
            false,
        );
    if !notified {
        embed = embed.footer(CreateEmbedFooter::new(
            "The applicant couldn't be reached by direct message.",
        ));
    }

    match data.response_channel().await {
        Ok(channel) => {
            channel
                .send_message(ctx, CreateMessage::new().embed(embed))
                .await?;
        }
        Err(e) => tracing::warn!("Decision not logged. {e}"),
    }

    tracing::info!("Application of {applicant} {verdict}.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(n: usize) -> Vec<Answer> {
        (0..n)
            .map(|i| Answer {
                question: format!("Question {i}"),
                answer: format!("Answer {i}"),
            })
            .collect()
    }

    #[test]
    fn default_form_fits_one_embed() {
        let form = ApplicationSettings::default().forms.remove(0);
        let answers = answers(form.questions.len());
        assert_eq!(submission_embeds(&form, UserId::new(1), &answers).len(), 1);
    }

    #[test]
    fn long_forms_continue_in_more_embeds() {
        let form = ApplicationSettings::default().forms.remove(0);
        // 30 answers plus the user field.
        assert_eq!(submission_embeds(&form, UserId::new(1), &answers(30)).len(), 2);
    }
}
