//! Embed colours and helpers for staying inside discord's embed limits.

use itertools::Itertools;
use serenity::Colour;
use serenity::CreateEmbed;

use crate::serenity;

pub const BLUE: Colour = Colour::new(0x3498DB);
pub const GREEN: Colour = Colour::new(0x2ECC71);
pub const RED: Colour = Colour::new(0xE74C3C);

/// Max length of an embed field name.
pub const FIELD_NAME_LIMIT: usize = 256;
/// Max length of an embed field value.
pub const FIELD_VALUE_LIMIT: usize = 1024;
/// Max number of fields in one embed.
pub const FIELDS_PER_EMBED: usize = 25;

/// Cuts `text` to at most `max` chars, marking the cut with an ellipsis.
/// Empty text becomes "-", since discord rejects empty fields.
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.is_empty() {
        return "-".to_string();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max - 1).collect();
    cut.push('…');
    cut
}

/// An embed field, `(name, value, inline)`.
pub type Field = (String, String, bool);

/// Makes a field with name and value cut down to their limits.
pub fn field(name: &str, value: &str, inline: bool) -> Field {
    (
        truncate(name, FIELD_NAME_LIMIT),
        truncate(value, FIELD_VALUE_LIMIT),
        inline,
    )
}

/// Spreads `fields` over as many embeds as needed.
/// The first embed is `first`, the following ones are built by `continued`.
pub fn chunk_fields(
    first: CreateEmbed,
    continued: impl Fn() -> CreateEmbed,
    fields: Vec<Field>,
) -> Vec<CreateEmbed> {
    let mut embeds = Vec::new();
    let mut next = Some(first);
    for chunk in &fields.into_iter().chunks(FIELDS_PER_EMBED) {
        let embed = next.take().unwrap_or_else(&continued);
        embeds.push(embed.fields(chunk));
    }
    // Keep the header even without any fields.
    embeds.extend(next);
    embeds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate("  yes  ", 10), "yes");
    }

    #[test]
    fn empty_text_becomes_a_dash() {
        assert_eq!(truncate("   ", 10), "-");
    }

    #[test]
    fn long_text_is_cut_on_chars() {
        let cut = truncate("ééééé", 3);
        assert_eq!(cut, "éé…");
        assert_eq!(cut.chars().count(), 3);
    }

    #[test]
    fn fields_are_spread_over_embeds() {
        let fields: Vec<Field> = (0..30).map(|i| field(&i.to_string(), "a", false)).collect();
        let embeds = chunk_fields(CreateEmbed::new(), CreateEmbed::new, fields);
        assert_eq!(embeds.len(), 2);
    }

    #[test]
    fn header_is_kept_without_fields() {
        let embeds = chunk_fields(CreateEmbed::new(), CreateEmbed::new, Vec::new());
        assert_eq!(embeds.len(), 1);
    }
}
