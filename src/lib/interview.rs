//! Asks the questions of an [ApplicationForm] one at a time and collects the answers.
//!
//! Every answer has to arrive within the answer timeout, otherwise the interview
//! is abandoned. The exchange runs over a [Conversation], which is a direct
//! message channel in production.

use std::time::Duration;

use futures::stream::BoxStream;
use futures::StreamExt;
use serenity::ChannelId;
use serenity::MessageCollector;
use serenity::UserId;

use crate::data::ApplicationForm;
use crate::error::SupportError;
use crate::serenity;

/// A two-way text channel with one applicant.
pub trait Conversation {
    /// Sends `text` to the applicant.
    async fn say(&mut self, text: String) -> Result<(), SupportError>;

    /// Waits up to `timeout` for the applicant's next message.
    /// `None` means nothing arrived in time.
    async fn listen(&mut self, timeout: Duration) -> Result<Option<String>, SupportError>;
}

/// A question and the applicant's answer to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub question: String,
    pub answer: String,
}

/// How an interview ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every question got an answer, in form order.
    Completed(Vec<Answer>),
    /// The applicant stopped answering after `answered` questions.
    TimedOut { answered: usize },
}

/// Runs `form` over `conversation`.
pub async fn run(
    conversation: &mut impl Conversation,
    form: &ApplicationForm,
    timeout: Duration,
) -> Result<Outcome, SupportError> {
    conversation
        .say(format!(
            "Starting your application for '{}'. Please answer the following questions.",
            form.name
        ))
        .await?;

    let mut answers = Vec::with_capacity(form.questions.len());
    for question in &form.questions {
        conversation.say(format!("**{question}**")).await?;

        match conversation.listen(timeout).await? {
            Some(answer) => answers.push(Answer {
                question: question.clone(),
                answer,
            }),
            None => {
                tracing::debug!("Applicant stopped after {} answers.", answers.len());
                return Ok(Outcome::TimedOut {
                    answered: answers.len(),
                });
            }
        }
    }

    Ok(Outcome::Completed(answers))
}

/// A [Conversation] over the applicant's direct messages.
pub struct DirectMessages<'a> {
    ctx: &'a serenity::Context,
    channel: ChannelId,
    /// Registered once, so answers sent right after a question aren't missed.
    replies: BoxStream<'a, serenity::Message>,
}

impl<'a> DirectMessages<'a> {
    /// Opens a direct message channel with `user`.
    pub async fn open(ctx: &'a serenity::Context, user: UserId) -> Result<Self, SupportError> {
        let channel = user.create_dm_channel(ctx).await?.id;
        let replies = MessageCollector::new(ctx)
            .author_id(user)
            .channel_id(channel)
            .stream()
            .boxed();

        Ok(Self {
            ctx,
            channel,
            replies,
        })
    }
}

impl Conversation for DirectMessages<'_> {
    async fn say(&mut self, text: String) -> Result<(), SupportError> {
        self.channel.say(self.ctx, text).await?;
        Ok(())
    }

    async fn listen(&mut self, timeout: Duration) -> Result<Option<String>, SupportError> {
        let reply = tokio::time::timeout(timeout, self.replies.next()).await;
        // A closed stream means the shard went away, which ends the interview too.
        Ok(reply.ok().flatten().map(|msg| msg.content))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Replays scripted answers and records what was said.
    #[derive(Default)]
    struct Script {
        answers: VecDeque<Option<String>>,
        said: Vec<String>,
        fail_after: Option<usize>,
    }

    impl Script {
        fn answering(answers: &[Option<&str>]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.map(str::to_string)).collect(),
                ..Default::default()
            }
        }
    }

    impl Conversation for Script {
        async fn say(&mut self, text: String) -> Result<(), SupportError> {
            if self.fail_after == Some(self.said.len()) {
                return Err(serenity::Error::Other("dms closed").into());
            }
            self.said.push(text);
            Ok(())
        }

        async fn listen(&mut self, _timeout: Duration) -> Result<Option<String>, SupportError> {
            Ok(self.answers.pop_front().flatten())
        }
    }

    fn form() -> ApplicationForm {
        ApplicationForm {
            name: "Moderator".to_string(),
            description: String::new(),
            questions: vec!["Name?".to_string(), "Timezone?".to_string()],
        }
    }

    #[tokio::test]
    async fn collects_answers_in_order() {
        let mut script = Script::answering(&[Some("Ferris"), Some("UTC")]);
        let outcome = run(&mut script, &form(), Duration::from_secs(1)).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Completed(vec![
                Answer {
                    question: "Name?".to_string(),
                    answer: "Ferris".to_string()
                },
                Answer {
                    question: "Timezone?".to_string(),
                    answer: "UTC".to_string()
                },
            ])
        );
        assert_eq!(
            script.said,
            [
                "Starting your application for 'Moderator'. Please answer the following questions.",
                "**Name?**",
                "**Timezone?**",
            ]
        );
    }

    #[tokio::test]
    async fn stops_at_the_first_silence() {
        let mut script = Script::answering(&[Some("Ferris"), None, Some("late")]);
        let outcome = run(&mut script, &form(), Duration::from_secs(1)).await.unwrap();

        assert_eq!(outcome, Outcome::TimedOut { answered: 1 });
        assert_eq!(script.said.len(), 3);
        // Answers after a timeout are never read.
        assert_eq!(script.answers.len(), 1);
    }

    #[tokio::test]
    async fn send_failures_end_the_interview() {
        let mut script = Script {
            fail_after: Some(0),
            ..Script::answering(&[Some("Ferris")])
        };
        assert!(run(&mut script, &form(), Duration::from_secs(1)).await.is_err());
        assert!(script.said.is_empty());
    }
}
