//! Misc

pub mod application;
pub mod custom_id;
pub mod embeds;
pub mod events;
pub mod interview;
pub mod ticket;
pub mod transcript;

use std::time::Duration;

/// Helper function to format a duration in words, e.g. "1 minute 30 seconds".
pub fn format_duration(dur: &Duration) -> String {
    let total_secs = dur.as_secs();
    let mins = total_secs / 60;
    let secs = total_secs % 60;

    let unit = |n: u64, name: &str| {
        if n == 1 {
            format!("1 {name}")
        } else {
            format!("{n} {name}s")
        }
    };

    match (mins, secs) {
        (0, secs) => unit(secs, "second"),
        (mins, 0) => unit(mins, "minute"),
        (mins, secs) => format!("{} {}", unit(mins, "minute"), unit(secs, "second")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(&Duration::from_secs(0)), "0 seconds");
        assert_eq!(format_duration(&Duration::from_secs(1)), "1 second");
        assert_eq!(format_duration(&Duration::from_secs(5)), "5 seconds");
        assert_eq!(format_duration(&Duration::from_secs(60)), "1 minute");
        assert_eq!(format_duration(&Duration::from_secs(120)), "2 minutes");
        assert_eq!(format_duration(&Duration::from_secs(90)), "1 minute 30 seconds");
    }
}
