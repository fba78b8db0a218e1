//! Manages ticket channels.
//!
//! A ticket is a private text channel inside the ticket category. Its topic holds a
//! [TicketMarker] naming the owner and support type, which is how every other
//! command recognizes a ticket.

use serenity::ButtonStyle;
use serenity::ChannelId;
use serenity::ChannelType;
use serenity::CreateActionRow;
use serenity::CreateButton;
use serenity::CreateChannel;
use serenity::CreateEmbed;
use serenity::CreateEmbedFooter;
use serenity::CreateInputText;
use serenity::CreateMessage;
use serenity::CreateModal;
use serenity::CreateSelectMenu;
use serenity::CreateSelectMenuKind;
use serenity::CreateSelectMenuOption;
use serenity::GuildChannel;
use serenity::GuildId;
use serenity::InputTextStyle;
use serenity::Mentionable;
use serenity::PermissionOverwrite;
use serenity::PermissionOverwriteType;
use serenity::Permissions;
use serenity::RoleId;
use serenity::User;
use serenity::UserId;
use tracing::instrument;

use super::custom_id::ComponentId;
use super::embeds;
use crate::data::SupportType;
use crate::data::TicketSettings;
use crate::error::SupportError;
use crate::error::UserError;
use crate::serenity;

/// Custom id of the reason input in the ticket modal.
pub const REASON_INPUT: &str = "reason";

/// Discord limits modal titles to 45 chars.
const MODAL_TITLE_LIMIT: usize = 45;

/// Discord limits channel names to 100 chars.
const CHANNEL_NAME_LIMIT: usize = 100;

/// What members of a ticket can do in it.
const MEMBER_PERMISSIONS: Permissions = Permissions::VIEW_CHANNEL
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::READ_MESSAGE_HISTORY)
    .union(Permissions::ATTACH_FILES);

/// Owner and support type of a ticket, stored in the channel topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketMarker {
    pub owner: UserId,
    pub support_type: String,
}

impl TicketMarker {
    const OWNER_KEY: &'static str = "ticket-owner:";
    const TYPE_KEY: &'static str = "ticket-type:";

    /// The channel topic carrying this marker.
    pub fn topic(&self) -> String {
        format!(
            "{} ticket for {} | {}{} {}{}",
            self.support_type,
            self.owner.mention(),
            Self::OWNER_KEY,
            self.owner,
            Self::TYPE_KEY,
            self.support_type
        )
    }

    /// Reads a marker back from a channel topic.
    pub fn parse(topic: &str) -> Option<Self> {
        let (_, after_owner) = topic.split_once(Self::OWNER_KEY)?;
        let owner: String = after_owner.chars().take_while(char::is_ascii_digit).collect();
        let owner = match owner.parse::<u64>() {
            Ok(0) | Err(_) => return None,
            Ok(id) => UserId::new(id),
        };

        // The type goes last since names may contain spaces.
        let (_, support_type) = after_owner.split_once(Self::TYPE_KEY)?;
        let support_type = support_type.trim();
        if support_type.is_empty() {
            return None;
        }

        Some(Self {
            owner,
            support_type: support_type.to_string(),
        })
    }

    /// Reads the marker of `channel`, failing if it isn't a ticket.
    pub fn of_channel(channel: &GuildChannel) -> Result<Self, UserError> {
        channel
            .topic
            .as_deref()
            .and_then(Self::parse)
            .ok_or(UserError::NotTicketChannel)
    }

    /// Fetches `channel` and reads its marker.
    pub async fn fetch(
        ctx: &serenity::Context,
        channel: ChannelId,
    ) -> Result<(GuildChannel, Self), SupportError> {
        let channel = channel
            .to_channel(ctx)
            .await?
            .guild()
            .ok_or(UserError::NotTicketChannel)?;
        let marker = Self::of_channel(&channel)?;
        Ok((channel, marker))
    }
}

/// Name of a new ticket channel, `ticket-<username>` in discord's channel name charset.
pub fn channel_name(username: &str) -> String {
    let name: String = format!("ticket-{username}")
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' => c,
            _ => '-',
        })
        .take(CHANNEL_NAME_LIMIT)
        .collect();
    name
}

/// Who is trying to claim a ticket.
#[derive(Debug, Clone, Copy)]
pub struct Claimer<'a> {
    pub id: UserId,
    pub roles: &'a [RoleId],
    pub permissions: Option<Permissions>,
}

/// Checks that `claimer` may claim the ticket of `marker`, which requires `required_role`.
/// Anyone able to manage channels may claim any ticket, except their own.
pub fn check_claim(
    claimer: Claimer<'_>,
    marker: &TicketMarker,
    required_role: Option<RoleId>,
) -> Result<(), UserError> {
    if claimer.id == marker.owner {
        return Err(UserError::CannotClaimOwnTicket);
    }

    let is_manager = claimer.permissions.is_some_and(|p| {
        p.contains(Permissions::MANAGE_CHANNELS) || p.contains(Permissions::ADMINISTRATOR)
    });
    let has_role = required_role.is_some_and(|role| claimer.roles.contains(&role));
    if is_manager || has_role {
        Ok(())
    } else {
        Err(UserError::CannotClaim)
    }
}

/// The panel embed and its support type menu.
pub fn panel(settings: &TicketSettings) -> (CreateEmbed, CreateActionRow) {
    let embed = CreateEmbed::new()
        .title(format!("{} Panel", settings.brand))
        .description("Choose a support type in the following menu")
        .colour(embeds::BLUE);

    let options = settings
        .support_types
        .iter()
        .map(|t| {
            let option = CreateSelectMenuOption::new(&t.name, &t.name);
            match t.description.is_empty() {
                true => option,
                false => option.description(&t.description),
            }
        })
        .collect();
    let menu = CreateSelectMenu::new(
        ComponentId::TicketPanel.to_string(),
        CreateSelectMenuKind::String { options },
    )
    .placeholder("Choose a support type")
    .min_values(1)
    .max_values(1);

    (embed, CreateActionRow::SelectMenu(menu))
}

/// Title of the reason modal, `<brand> - <type>`.
fn modal_title(settings: &TicketSettings, support_type: &SupportType) -> String {
    format!("{} - {}", settings.brand, support_type.name)
        .chars()
        .take(MODAL_TITLE_LIMIT)
        .collect()
}

/// The modal asking for a ticket's reason.
pub fn reason_modal(settings: &TicketSettings, support_type: &SupportType) -> CreateModal {
    let title = modal_title(settings, support_type);
    let custom_id = ComponentId::TicketModal {
        support_type: support_type.name.clone(),
    };
    let reason = CreateInputText::new(InputTextStyle::Paragraph, "Reason", REASON_INPUT)
        .max_length(embeds::FIELD_VALUE_LIMIT as u16)
        .required(true);

    CreateModal::new(custom_id.to_string(), title)
        .components(vec![CreateActionRow::InputText(reason)])
}

/// Buttons under the ticket's welcome embed.
fn ticket_buttons(claimable: bool) -> CreateActionRow {
    let claim = CreateButton::new(ComponentId::ClaimTicket.to_string())
        .label("Claim Ticket")
        .style(ButtonStyle::Success);
    let close = CreateButton::new(ComponentId::CloseTicket.to_string())
        .label("Close Ticket")
        .style(ButtonStyle::Danger);

    if claimable {
        CreateActionRow::Buttons(vec![claim, close])
    } else {
        CreateActionRow::Buttons(vec![close])
    }
}

/// Buttons of a claimed ticket, the claim button is gone.
pub fn claimed_buttons() -> CreateActionRow {
    ticket_buttons(false)
}

/// The "Yes"/"No" buttons asking to confirm a close.
pub fn confirm_close_buttons() -> CreateActionRow {
    CreateActionRow::Buttons(vec![
        CreateButton::new(ComponentId::ConfirmClose.to_string())
            .label("Yes")
            .style(ButtonStyle::Danger),
        CreateButton::new(ComponentId::CancelClose.to_string())
            .label("No")
            .style(ButtonStyle::Secondary),
    ])
}

/// Creates a ticket for `opener` and posts the welcome message in it.
#[instrument(skip_all, fields(guild = %guild_id, opener = %opener.name, support_type = %support_type.name))]
pub async fn open(
    ctx: &serenity::Context,
    settings: &TicketSettings,
    guild_id: GuildId,
    opener: &User,
    support_type: &SupportType,
    reason: &str,
) -> Result<GuildChannel, SupportError> {
    let category = ticket_category(ctx, guild_id, &settings.category).await?;

    if let Some(channel) = find_open_ticket(ctx, guild_id, category, opener.id).await? {
        Err(UserError::TicketAlreadyOpen { channel })?
    }

    let marker = TicketMarker {
        owner: opener.id,
        support_type: support_type.name.clone(),
    };
    let overwrites = overwrites(ctx, guild_id, opener.id, support_type.role).await?;

    let channel = guild_id
        .create_channel(
            ctx,
            CreateChannel::new(channel_name(&opener.name))
                .kind(ChannelType::Text)
                .category(category)
                .topic(marker.topic())
                .permissions(overwrites),
        )
        .await?;
    tracing::info!("Opened ticket {}.", channel.name);

    let embed = CreateEmbed::new()
        .title(&settings.brand)
        .colour(embeds::BLUE)
        .field("Type:", &support_type.name, false)
        .field("Reason:", embeds::truncate(reason, embeds::FIELD_VALUE_LIMIT), false)
        .footer(CreateEmbedFooter::new(
            "Use the button below to close this ticket.",
        ));
    let welcome = CreateMessage::new()
        .content(opener.mention().to_string())
        .embed(embed)
        .components(vec![ticket_buttons(true)]);
    channel.id.send_message(ctx, welcome).await?;

    Ok(channel)
}

/// Finds the ticket category, creating it if it doesn't exist yet.
async fn ticket_category(
    ctx: &serenity::Context,
    guild_id: GuildId,
    name: &str,
) -> Result<ChannelId, SupportError> {
    let channels = guild_id.channels(ctx).await?;
    let existing = channels
        .values()
        .find(|c| c.kind == ChannelType::Category && c.name.eq_ignore_ascii_case(name));

    match existing {
        Some(category) => Ok(category.id),
        None => {
            tracing::info!("Creating the '{name}' category.");
            let category = guild_id
                .create_channel(ctx, CreateChannel::new(name).kind(ChannelType::Category))
                .await?;
            Ok(category.id)
        }
    }
}

/// The ticket `owner` already has open in `category`, if any.
async fn find_open_ticket(
    ctx: &serenity::Context,
    guild_id: GuildId,
    category: ChannelId,
    owner: UserId,
) -> Result<Option<ChannelId>, SupportError> {
    let channels = guild_id.channels(ctx).await?;
    let open = channels.values().find(|c| {
        c.parent_id == Some(category)
            && TicketMarker::of_channel(c).is_ok_and(|marker| marker.owner == owner)
    });
    Ok(open.map(|c| c.id))
}

/// Permission overwrites of a new ticket.
/// Hidden from everyone except the opener, the support role and the bot.
async fn overwrites(
    ctx: &serenity::Context,
    guild_id: GuildId,
    opener: UserId,
    role: Option<RoleId>,
) -> Result<Vec<PermissionOverwrite>, SupportError> {
    let bot = ctx.cache.current_user().id;
    let mut overwrites = vec![
        PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            kind: PermissionOverwriteType::Role(guild_id.everyone_role()),
        },
        PermissionOverwrite {
            allow: MEMBER_PERMISSIONS,
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Member(opener),
        },
        PermissionOverwrite {
            allow: MEMBER_PERMISSIONS | Permissions::MANAGE_CHANNELS,
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Member(bot),
        },
    ];

    if let Some(role) = role {
        if guild_id.roles(ctx).await?.contains_key(&role) {
            overwrites.push(PermissionOverwrite {
                allow: MEMBER_PERMISSIONS,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Role(role),
            });
        } else {
            tracing::warn!("Support role {role} doesn't exist in guild {guild_id}.");
        }
    }

    Ok(overwrites)
}

/// Lets `member` see and write in a ticket.
pub async fn add_member(
    ctx: &serenity::Context,
    channel: ChannelId,
    member: UserId,
) -> Result<(), SupportError> {
    let overwrite = PermissionOverwrite {
        allow: MEMBER_PERMISSIONS,
        deny: Permissions::empty(),
        kind: PermissionOverwriteType::Member(member),
    };
    channel.create_permission(ctx, overwrite).await?;
    Ok(())
}

/// Removes `member`'s access to a ticket. The owner can't be removed.
pub async fn remove_member(
    ctx: &serenity::Context,
    channel: &GuildChannel,
    member: UserId,
) -> Result<(), SupportError> {
    let marker = TicketMarker::of_channel(channel)?;
    if marker.owner == member {
        Err(UserError::CannotRemoveOwner)?
    }
    channel
        .id
        .delete_permission(ctx, PermissionOverwriteType::Member(member))
        .await?;
    Ok(())
}

/// Waits out the countdown, exports the transcript and deletes the ticket.
#[instrument(skip(ctx, settings, channel), fields(channel = %channel.name))]
pub async fn close(
    ctx: &serenity::Context,
    settings: &TicketSettings,
    channel: &GuildChannel,
    marker: &TicketMarker,
) -> Result<(), SupportError> {
    tokio::time::sleep(settings.close_countdown()).await;

    // A missing transcript shouldn't keep the ticket open.
    if let Err(e) = super::transcript::export(ctx, settings, channel, marker).await {
        tracing::error!("Failed to export transcript of {}. {e}", channel.name);
    }

    channel.id.delete(ctx).await?;
    tracing::info!("Closed ticket {}.", channel.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker() -> TicketMarker {
        TicketMarker {
            owner: UserId::new(1234),
            support_type: "Staff Report".to_string(),
        }
    }

    #[test]
    fn markers_survive_the_topic() {
        let marker = marker();
        assert_eq!(TicketMarker::parse(&marker.topic()), Some(marker));
    }

    #[test]
    fn topics_without_markers_are_not_tickets() {
        assert_eq!(TicketMarker::parse("General chat"), None);
        assert_eq!(TicketMarker::parse("ticket-owner: ticket-type:IA"), None);
        assert_eq!(TicketMarker::parse("ticket-owner:0 ticket-type:IA"), None);
        assert_eq!(TicketMarker::parse("ticket-owner:12 ticket-type:  "), None);
    }

    #[test]
    fn channel_names_use_discords_charset() {
        assert_eq!(channel_name("Cool.Guy 99"), "ticket-cool-guy-99");
        assert_eq!(channel_name("under_score"), "ticket-under_score");
        assert_eq!(channel_name(&"x".repeat(200)).len(), CHANNEL_NAME_LIMIT);
    }

    fn claimer(id: u64, roles: &[RoleId], permissions: Option<Permissions>) -> Claimer<'_> {
        Claimer {
            id: UserId::new(id),
            roles,
            permissions,
        }
    }

    #[test]
    fn staff_with_the_role_may_claim() {
        let role = RoleId::new(7);
        let roles = [RoleId::new(1), role];
        assert!(check_claim(claimer(5, &roles, None), &marker(), Some(role)).is_ok());
        assert!(matches!(
            check_claim(claimer(5, &roles[..1], None), &marker(), Some(role)),
            Err(UserError::CannotClaim)
        ));
    }

    #[test]
    fn managers_may_claim_anything() {
        let perms = Some(Permissions::MANAGE_CHANNELS | Permissions::SEND_MESSAGES);
        assert!(check_claim(claimer(5, &[], perms), &marker(), None).is_ok());
        let admin = Some(Permissions::ADMINISTRATOR);
        assert!(check_claim(claimer(5, &[], admin), &marker(), Some(RoleId::new(7))).is_ok());
        let member = Some(Permissions::SEND_MESSAGES);
        assert!(check_claim(claimer(5, &[], member), &marker(), None).is_err());
    }

    #[test]
    fn owners_never_claim_their_own_ticket() {
        let role = RoleId::new(7);
        let owner = marker().owner.get();
        let admin = Some(Permissions::ADMINISTRATOR);
        assert!(matches!(
            check_claim(claimer(owner, &[role], admin), &marker(), Some(role)),
            Err(UserError::CannotClaimOwnTicket)
        ));
    }

    #[test]
    fn modal_titles_fit_discords_limit() {
        let settings = TicketSettings::default();
        let general = settings.support_type("General").unwrap();
        assert_eq!(modal_title(&settings, general), "LARP Support - General");

        let long = SupportType {
            name: "A".repeat(80),
            description: String::new(),
            role: None,
        };
        assert_eq!(modal_title(&settings, &long).chars().count(), MODAL_TITLE_LIMIT);
    }
}
