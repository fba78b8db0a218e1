//! Custom ids of buttons, select menus and modals.
//!
//! Everything a component handler needs is encoded in its id, so components sent
//! before a restart keep working and no view state has to be stored.

use std::fmt::Display;
use std::str::FromStr;

use serenity::Colour;
use serenity::UserId;

use crate::error::SupportError;
use crate::serenity;

/// Outcome of a reviewed application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Denied,
}

impl Verdict {
    /// Lowercase form used inside custom ids.
    fn slug(self) -> &'static str {
        match self {
            Verdict::Accepted => "accepted",
            Verdict::Denied => "denied",
        }
    }

    pub fn colour(self) -> Colour {
        match self {
            Verdict::Accepted => super::embeds::GREEN,
            Verdict::Denied => super::embeds::RED,
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Accepted => write!(f, "Accepted"),
            Verdict::Denied => write!(f, "Denied"),
        }
    }
}

impl FromStr for Verdict {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(Verdict::Accepted),
            "denied" => Ok(Verdict::Denied),
            _ => Err(()),
        }
    }
}

/// Identifies what a component interaction or modal submission is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentId {
    /// Select menu of the ticket panel.
    TicketPanel,
    /// Reason modal for a new ticket of the given support type.
    TicketModal { support_type: String },
    /// "Close Ticket" button inside a ticket.
    CloseTicket,
    /// "Yes" on the close confirmation.
    ConfirmClose,
    /// "No" on the close confirmation.
    CancelClose,
    /// "Claim Ticket" button inside a ticket.
    ClaimTicket,
    /// Select menu of the application panel.
    ApplicationPanel,
    /// Accept or deny button on a submitted application.
    Decide { verdict: Verdict, applicant: UserId },
    /// Reason modal opened by [ComponentId::Decide].
    DecisionModal { verdict: Verdict, applicant: UserId },
}

impl Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentId::TicketPanel => write!(f, "ticket:panel"),
            ComponentId::TicketModal { support_type } => write!(f, "ticket:modal:{support_type}"),
            ComponentId::CloseTicket => write!(f, "ticket:close"),
            ComponentId::ConfirmClose => write!(f, "ticket:close:yes"),
            ComponentId::CancelClose => write!(f, "ticket:close:no"),
            ComponentId::ClaimTicket => write!(f, "ticket:claim"),
            ComponentId::ApplicationPanel => write!(f, "app:select"),
            ComponentId::Decide { verdict, applicant } => {
                write!(f, "app:decide:{}:{applicant}", verdict.slug())
            }
            ComponentId::DecisionModal { verdict, applicant } => {
                write!(f, "app:reason:{}:{applicant}", verdict.slug())
            }
        }
    }
}

impl FromStr for ComponentId {
    type Err = SupportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SupportError::MalformedCustomId(s.to_string());

        // Support type names may contain ':', so the last part is kept whole.
        let parts: Vec<&str> = s.splitn(3, ':').collect();
        let id = match parts.as_slice() {
            ["ticket", "panel"] => ComponentId::TicketPanel,
            ["ticket", "modal", support_type] if !support_type.is_empty() => {
                ComponentId::TicketModal {
                    support_type: support_type.to_string(),
                }
            }
            ["ticket", "close"] => ComponentId::CloseTicket,
            ["ticket", "close", "yes"] => ComponentId::ConfirmClose,
            ["ticket", "close", "no"] => ComponentId::CancelClose,
            ["ticket", "claim"] => ComponentId::ClaimTicket,
            ["app", "select"] => ComponentId::ApplicationPanel,
            ["app", action @ ("decide" | "reason"), rest] => {
                let (verdict, applicant) = rest.split_once(':').ok_or_else(malformed)?;
                let verdict = verdict.parse().map_err(|_| malformed())?;
                let applicant = match applicant.parse::<u64>() {
                    Ok(0) | Err(_) => return Err(malformed()),
                    Ok(id) => UserId::new(id),
                };
                if *action == "decide" {
                    ComponentId::Decide { verdict, applicant }
                } else {
                    ComponentId::DecisionModal { verdict, applicant }
                }
            }
            _ => return Err(malformed()),
        };
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_back_to_themselves() {
        let applicant = UserId::new(1352595235976380508);
        let ids = [
            ComponentId::TicketPanel,
            ComponentId::TicketModal {
                support_type: "IA".to_string(),
            },
            ComponentId::CloseTicket,
            ComponentId::ConfirmClose,
            ComponentId::CancelClose,
            ComponentId::ClaimTicket,
            ComponentId::ApplicationPanel,
            ComponentId::Decide {
                verdict: Verdict::Accepted,
                applicant,
            },
            ComponentId::DecisionModal {
                verdict: Verdict::Denied,
                applicant,
            },
        ];
        for id in ids {
            assert_eq!(id.to_string().parse::<ComponentId>().unwrap(), id);
        }
    }

    #[test]
    fn decision_ids_carry_the_applicant() {
        let id: ComponentId = "app:reason:denied:42".parse().unwrap();
        assert_eq!(
            id,
            ComponentId::DecisionModal {
                verdict: Verdict::Denied,
                applicant: UserId::new(42),
            }
        );
    }

    #[test]
    fn support_types_may_contain_colons() {
        let id: ComponentId = "ticket:modal:Staff: Senior".parse().unwrap();
        assert_eq!(
            id,
            ComponentId::TicketModal {
                support_type: "Staff: Senior".to_string()
            }
        );
    }

    #[test]
    fn unknown_ids_are_rejected() {
        for bad in [
            "",
            "ticket",
            "ticket:modal:",
            "ticket:close:maybe",
            "app:decide:accepted",
            "app:decide:maybe:42",
            "app:decide:accepted:0",
            "app:reason:denied:someone",
            "queue:skip",
        ] {
            assert!(bad.parse::<ComponentId>().is_err(), "{bad} parsed");
        }
    }
}
