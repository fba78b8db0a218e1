//! Application forms asked over direct messages.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serenity::ChannelId;

use crate::error::UserError;
use crate::serenity;

/// A named list of questions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicationForm {
    pub name: String,
    pub description: String,
    pub questions: Vec<String>,
}

/// Settings for applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    /// Initial channel for submissions and decisions, can be changed with `/set_app_channel`.
    #[serde(with = "super::opt_id", default)]
    pub response_channel: Option<ChannelId>,
    /// How long to wait for each answer.
    pub answer_timeout_secs: u64,
    /// Forms listed in the application panel.
    pub forms: Vec<ApplicationForm>,
}

impl ApplicationSettings {
    /// Form at `index` in the panel.
    pub fn form(&self, index: usize) -> Result<&ApplicationForm, UserError> {
        self.forms.get(index).ok_or(UserError::UnknownForm)
    }

    pub fn answer_timeout(&self) -> Duration {
        Duration::from_secs(self.answer_timeout_secs)
    }
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        let questions = [
            "What is your discord username?",
            "What is your roblox username?",
            "Do you understand that asking for your application to be read will result in a denial?",
            "Explain what is RDM and the punishment for it.",
            "Explain what is VDM and the punishment for it.",
            "Explain what is LTAP and the punishment for it.",
            "Explain what is NITRP and the punishment for it.",
            "Explain what is Tool Abuse and the punishment for it.",
            "Do you understand that you have to go trough a training when your application gets accepted?",
            "Do you understand that requesting a role will result to a termination?",
            "Do you understand that you will be required to use SPaG?",
            "What is your timezone and do you have any questions?",
        ];

        Self {
            response_channel: Some(ChannelId::new(1352595235976380508)),
            answer_timeout_secs: 120,
            forms: vec![ApplicationForm {
                name: "In-Game Moderator Application".to_string(),
                description: "Apply for the moderator role".to_string(),
                questions: questions.iter().map(|q| q.to_string()).collect(),
            }],
        }
    }
}
