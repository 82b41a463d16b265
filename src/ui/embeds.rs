use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
};

use crate::audio::session::{PlaybackState, SessionSnapshot};

/// Paleta de colores del bot
pub mod colors {
    use serenity::all::Colour;

    pub const SPOTIFY_GREEN: Colour = Colour::from_rgb(0x1D, 0xB9, 0x54);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
}

const STANDARD_FOOTER: &str = "🎵 jukebot";

/// Máximo de líneas de la cola mostradas en un mensaje.
const MAX_LISTED: usize = 20;

/// Embed genérico para anuncios (now playing, etc.)
pub fn announcement(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .description(description)
        .color(colors::SPOTIFY_GREEN)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

pub fn help() -> CreateEmbed {
    CreateEmbed::new()
        .title("📖 Commands")
        .description(help_text())
        .color(colors::INFO_BLUE)
}

pub fn help_text() -> String {
    let lines = [
        ("play <query>", "Plays a song, or adds it to the queue"),
        ("queue", "Shows the queue"),
        ("pause / resume", "Pauses or resumes the current song"),
        ("skip", "Skips the current song"),
        ("stop", "Stops the music and clears the queue"),
        ("loop", "Repeats the current song"),
        ("pin / pinlist / unpin <n>", "Pin utilities"),
        ("choose a or b", "Picks one option for you"),
    ];

    lines
        .iter()
        .map(|(usage, what)| format!("**{}** - {}", usage, what))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Texto del comando `queue`. `None` si la cola está vacía.
pub fn queue_listing(snapshot: &SessionSnapshot) -> Option<String> {
    if snapshot.entries.is_empty() {
        return None;
    }

    let mut response = String::from("**🎵 Current Queue:**\n");
    for entry in snapshot.entries.iter().take(MAX_LISTED) {
        let marker = match (entry.position, snapshot.playback) {
            (1, PlaybackState::Playing) => "▶",
            (1, PlaybackState::Paused) => "⏸",
            _ => "🎶",
        };
        response.push_str(&format!("{}. {} {}\n", entry.position, marker, entry.title));
    }

    let hidden = snapshot.entries.len().saturating_sub(MAX_LISTED);
    if hidden > 0 {
        response.push_str(&format!("…and {} more\n", hidden));
    }
    if snapshot.loop_enabled {
        response.push_str("🔁 Loop enabled\n");
    }

    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{
        queue::QueueEntry,
        session::{ConnectionState, PlaybackState},
    };
    use pretty_assertions::assert_eq;

    fn snapshot(titles: &[&str], playback: PlaybackState, loop_enabled: bool) -> SessionSnapshot {
        SessionSnapshot {
            connection: ConnectionState::Connected,
            playback,
            loop_enabled,
            entries: titles
                .iter()
                .enumerate()
                .map(|(i, title)| QueueEntry {
                    position: i + 1,
                    title: title.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn empty_queue_has_no_listing() {
        assert_eq!(queue_listing(&snapshot(&[], PlaybackState::Idle, false)), None);
    }

    #[test]
    fn listing_marks_the_head() {
        let listing = queue_listing(&snapshot(&["A", "B"], PlaybackState::Paused, true)).unwrap();
        assert_eq!(
            listing,
            "**🎵 Current Queue:**\n1. ⏸ A\n2. 🎶 B\n🔁 Loop enabled\n"
        );
    }

    #[test]
    fn long_listing_is_truncated() {
        let titles: Vec<String> = (1..=25).map(|i| format!("song {}", i)).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let listing = queue_listing(&snapshot(&refs, PlaybackState::Playing, false)).unwrap();

        assert!(listing.contains("20. 🎶 song 20"));
        assert!(!listing.contains("song 21\n"));
        assert!(listing.ends_with("…and 5 more\n"));
    }
}
