//! Plain text transcripts of closed tickets.

use std::fmt::Write;

use chrono::DateTime;
use futures::StreamExt;
use futures::TryStreamExt;
use serenity::ChannelId;
use serenity::CreateAttachment;
use serenity::CreateMessage;
use serenity::GuildChannel;
use serenity::Mentionable;
use serenity::Message;
use serenity::UserId;

use super::ticket::TicketMarker;
use crate::data::TicketSettings;
use crate::error::SupportError;
use crate::serenity;

/// One message of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    /// Seconds since the unix epoch.
    pub timestamp: i64,
    pub author: String,
    pub content: String,
    /// Titles of embeds, `None` for embeds without a title.
    pub embeds: Vec<Option<String>>,
    /// Urls of attachments.
    pub attachments: Vec<String>,
}

impl From<&Message> for TranscriptLine {
    fn from(msg: &Message) -> Self {
        Self {
            timestamp: msg.timestamp.unix_timestamp(),
            author: msg.author.name.clone(),
            content: msg.content.clone(),
            embeds: msg.embeds.iter().map(|e| e.title.clone()).collect(),
            attachments: msg.attachments.iter().map(|a| a.url.clone()).collect(),
        }
    }
}

/// Renders a transcript, one line per message, oldest first.
pub fn render(channel_name: &str, lines: &[TranscriptLine]) -> String {
    let mut buffer = format!("Transcript of #{channel_name}\n\n");
    for line in lines {
        let time = DateTime::from_timestamp(line.timestamp, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "<unknown time>".to_string());

        write!(buffer, "[{time}] {}: {}", line.author, line.content)
            .expect("write to string buffer can't fail");
        for embed in &line.embeds {
            let title = embed.as_deref().unwrap_or("untitled");
            write!(buffer, " [embed: {title}]").expect("write to string buffer can't fail");
        }
        for url in &line.attachments {
            write!(buffer, " [attachment: {url}]").expect("write to string buffer can't fail");
        }
        buffer.push('\n');
    }
    buffer
}

/// Fetches every message of `channel`, oldest first.
async fn fetch_lines(
    ctx: &serenity::Context,
    channel: &GuildChannel,
) -> Result<Vec<TranscriptLine>, SupportError> {
    // Discord pages messages newest first.
    let messages: Vec<Message> = channel.id.messages_iter(ctx).boxed().try_collect().await?;
    Ok(messages.iter().rev().map(TranscriptLine::from).collect())
}

/// Where transcripts are sent.
pub trait Mailbox {
    /// Posts `message` in `channel`.
    async fn post(&mut self, channel: ChannelId, message: CreateMessage) -> Result<(), SupportError>;

    /// Sends `message` to `user` in a DM.
    async fn dm(&mut self, user: UserId, message: CreateMessage) -> Result<(), SupportError>;
}

impl Mailbox for &serenity::Context {
    async fn post(&mut self, channel: ChannelId, message: CreateMessage) -> Result<(), SupportError> {
        channel.send_message(&**self, message).await?;
        Ok(())
    }

    async fn dm(&mut self, user: UserId, message: CreateMessage) -> Result<(), SupportError> {
        user.direct_message(&**self, message).await?;
        Ok(())
    }
}

/// Which copies of a transcript arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivered {
    pub logged: bool,
    pub sent_to_owner: bool,
}

/// Posts the transcript to the transcript channel and sends it to the ticket owner.
/// Each copy is sent regardless of the other, failures are only logged.
pub async fn export(
    ctx: &serenity::Context,
    settings: &TicketSettings,
    channel: &GuildChannel,
    marker: &TicketMarker,
) -> Result<Delivered, SupportError> {
    let lines = fetch_lines(ctx, channel).await?;
    let text = render(&channel.name, &lines);
    tracing::debug!("Rendered transcript of {} ({} messages).", channel.name, lines.len());

    let mut mailbox = ctx;
    Ok(deliver(&mut mailbox, settings.transcript_channel, &channel.name, marker, text).await)
}

/// Sends `text` as a file to the transcript channel, if any, and to the ticket owner.
pub async fn deliver(
    mailbox: &mut impl Mailbox,
    log_channel: Option<ChannelId>,
    channel_name: &str,
    marker: &TicketMarker,
    text: String,
) -> Delivered {
    let file = CreateAttachment::bytes(text.into_bytes(), format!("transcript-{channel_name}.txt"));

    let logged = match log_channel {
        Some(log_channel) => {
            let message = CreateMessage::new()
                .content(format!(
                    "Transcript of `{channel_name}` ({} ticket of {}).",
                    marker.support_type,
                    marker.owner.mention()
                ))
                .add_file(file.clone());
            match mailbox.post(log_channel, message).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("Couldn't post transcript of {channel_name} in {log_channel}. {e}");
                    false
                }
            }
        }
        None => false,
    };

    let message = CreateMessage::new()
        .content(format!("Your ticket `{channel_name}` was closed. Here's a transcript."))
        .add_file(file);
    let sent_to_owner = match mailbox.dm(marker.owner, message).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Couldn't send transcript to ticket owner {}. {e}", marker.owner);
            false
        }
    };

    Delivered {
        logged,
        sent_to_owner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(timestamp: i64, author: &str, content: &str) -> TranscriptLine {
        TranscriptLine {
            timestamp,
            author: author.to_string(),
            content: content.to_string(),
            embeds: Vec::new(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn renders_one_line_per_message() {
        let lines = [line(0, "alice", "hello"), line(61, "bob", "hi")];
        let text = render("ticket-alice", &lines);
        assert_eq!(
            text,
            "Transcript of #ticket-alice\n\n\
             [1970-01-01 00:00:00 UTC] alice: hello\n\
             [1970-01-01 00:01:01 UTC] bob: hi\n"
        );
    }

    #[test]
    fn notes_embeds_and_attachments() {
        let mut msg = line(0, "bot", "");
        msg.embeds = vec![Some("LARP Support".to_string()), None];
        msg.attachments = vec!["https://cdn.example/a.png".to_string()];

        let text = render("t", &[msg]);
        assert!(text.contains(
            "bot:  [embed: LARP Support] [embed: untitled] [attachment: https://cdn.example/a.png]"
        ));
    }

    /// Records who got a copy, refusing channel posts when `channel_down` is set.
    #[derive(Default)]
    struct Outbox {
        channel_down: bool,
        posted: Vec<ChannelId>,
        dms: Vec<UserId>,
    }

    impl Mailbox for Outbox {
        async fn post(&mut self, channel: ChannelId, _message: CreateMessage) -> Result<(), SupportError> {
            if self.channel_down {
                return Err(serenity::Error::Other("missing access").into());
            }
            self.posted.push(channel);
            Ok(())
        }

        async fn dm(&mut self, user: UserId, _message: CreateMessage) -> Result<(), SupportError> {
            self.dms.push(user);
            Ok(())
        }
    }

    fn marker() -> TicketMarker {
        TicketMarker {
            owner: UserId::new(42),
            support_type: "General Support".to_string(),
        }
    }

    #[tokio::test]
    async fn owner_gets_a_copy_when_the_log_channel_fails() {
        let mut outbox = Outbox {
            channel_down: true,
            ..Default::default()
        };
        let log_channel = Some(ChannelId::new(9));

        let delivered = deliver(&mut outbox, log_channel, "ticket-alice", &marker(), "text".into()).await;

        assert_eq!(
            delivered,
            Delivered {
                logged: false,
                sent_to_owner: true
            }
        );
        assert_eq!(outbox.dms, [UserId::new(42)]);
    }

    #[tokio::test]
    async fn both_copies_go_out() {
        let mut outbox = Outbox::default();
        let log_channel = Some(ChannelId::new(9));

        let delivered = deliver(&mut outbox, log_channel, "ticket-alice", &marker(), "text".into()).await;

        assert!(delivered.logged && delivered.sent_to_owner);
        assert_eq!(outbox.posted, [ChannelId::new(9)]);
    }
}
