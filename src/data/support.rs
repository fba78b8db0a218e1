//! Ticket settings and the support types users can open tickets for.

use std::time::Duration;

use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;
use serenity::ChannelId;
use serenity::RoleId;

use crate::error::UserError;
use crate::serenity;

/// A kind of ticket, shown as an option in the ticket panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupportType {
    /// Shown as the select option label, also stored in the ticket topic.
    pub name: String,
    /// Shown under the label in the select menu.
    pub description: String,
    /// Staff role that can see and claim tickets of this type.
    #[serde(with = "super::opt_id", default)]
    pub role: Option<RoleId>,
}

impl SupportType {
    #[allow(clippy::missing_docs_in_private_items)]
    fn new(name: &str, description: &str, role: u64) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            role: Some(RoleId::new(role)),
        }
    }
}

/// Settings for ticket channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSettings {
    /// Prefix of embed and modal titles, e.g. "LARP Support".
    pub brand: String,
    /// Name of the category ticket channels are created in.
    pub category: String,
    /// Seconds between confirming a close and deleting the channel.
    pub close_countdown_secs: u64,
    /// Where transcripts of closed tickets are posted. Empty to disable.
    #[serde(with = "super::opt_id", default)]
    pub transcript_channel: Option<ChannelId>,
    /// Options of the ticket panel.
    pub support_types: Vec<SupportType>,
}

impl TicketSettings {
    /// Finds a support type by name, ignoring case.
    pub fn support_type(&self, name: &str) -> Result<&SupportType, UserError> {
        self.support_types
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| UserError::UnknownSupportType {
                name: name.to_string(),
                known: self.support_types.iter().map(|t| &t.name).join(", "),
            })
    }

    /// Delay before a confirmed close deletes the channel.
    pub fn close_countdown(&self) -> Duration {
        Duration::from_secs(self.close_countdown_secs)
    }
}

impl Default for TicketSettings {
    fn default() -> Self {
        Self {
            brand: "LARP Support".to_string(),
            category: "Tickets".to_string(),
            close_countdown_secs: 5,
            transcript_channel: None,
            support_types: vec![
                SupportType::new("IA", "Report a staff member", 1352987568051851276),
                SupportType::new(
                    "Management",
                    "Support for management issues",
                    1352987681063436428,
                ),
                SupportType::new("Foundership", "Highly important matters", 1352987799212654697),
                SupportType::new("General", "Questions or issues", 1352982058586210304),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let settings = TicketSettings::default();
        let found = settings.support_type(" management ").unwrap();
        assert_eq!(found.name, "Management");
        assert_eq!(found.role, Some(RoleId::new(1352987681063436428)));
    }

    #[test]
    fn unknown_type_lists_known_ones() {
        let settings = TicketSettings::default();
        let err = settings.support_type("Billing").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown support type 'Billing'. Choose one of: IA, Management, Foundership, General."
        );
    }
}
