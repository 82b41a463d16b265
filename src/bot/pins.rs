//! Utilidades de pines y el comando `choose`.

use rand::seq::SliceRandom;
use serenity::{
    builder::GetMessages,
    http::Http,
    model::{channel::Message, mention::Mentionable},
};
use tracing::warn;

/// Cuántos mensajes hacia atrás revisa `pin`.
const PIN_LOOKBACK: u8 = 50;
const PREVIEW_CHARS: usize = 50;

/// Fija el mensaje de usuario más reciente anterior a `command`.
pub async fn pin_previous(http: &Http, command: &Message, prefix: &str) -> String {
    let history = match command
        .channel_id
        .messages(http, GetMessages::new().before(command.id).limit(PIN_LOOKBACK))
        .await
    {
        Ok(history) => history,
        Err(e) => {
            warn!("Error al leer historial de {}: {:?}", command.channel_id, e);
            return "Something went wrong while trying to pin.".to_string();
        }
    };

    let Some(target) = history
        .iter()
        .find(|msg| msg.id != command.id && is_pin_candidate(msg.author.bot, &msg.content, prefix))
    else {
        return "No suitable user messages found to pin!".to_string();
    };

    match target.pin(http).await {
        Ok(()) => format!("Pinned the message above, {}! 📌", command.author.mention()),
        Err(e) if is_forbidden(&e) => "I don't have permission to pin messages.".to_string(),
        Err(e) => {
            warn!("Error al fijar mensaje {}: {:?}", target.id, e);
            "Something went wrong while trying to pin.".to_string()
        }
    }
}

pub async fn list_pins(http: &Http, command: &Message) -> String {
    match command.channel_id.pins(http).await {
        Ok(pinned) => {
            let contents: Vec<&str> = pinned.iter().map(|msg| msg.content.as_str()).collect();
            format_pin_list(&contents)
        }
        Err(e) => {
            warn!("Error al leer pins de {}: {:?}", command.channel_id, e);
            "Something went wrong while reading the pins.".to_string()
        }
    }
}

/// Desfija el mensaje fijado número `number` (desde 1, más nuevo primero).
pub async fn unpin(http: &Http, command: &Message, number: Option<usize>, prefix: &str) -> String {
    let pinned = match command.channel_id.pins(http).await {
        Ok(pinned) => pinned,
        Err(e) => {
            warn!("Error al leer pins de {}: {:?}", command.channel_id, e);
            return "Something went wrong while trying to unpin.".to_string();
        }
    };

    if pinned.is_empty() {
        return "No pinned messages to unpin.".to_string();
    }

    let Some(index) = unpin_index(pinned.len(), number) else {
        return format!(
            "Please specify a valid message number to unpin (e.g., `{}unpin 2`).",
            prefix
        );
    };

    match command.channel_id.unpin(http, pinned[index].id).await {
        Ok(()) => format!(
            "Unpinned message #{}, {}.",
            index + 1,
            command.author.mention()
        ),
        Err(e) if is_forbidden(&e) => "I don't have permission to unpin messages.".to_string(),
        Err(e) => {
            warn!("Error al desfijar mensaje {}: {:?}", pinned[index].id, e);
            "Something went wrong while trying to unpin.".to_string()
        }
    }
}

/// Nunca se fijan mensajes de bots ni otros comandos.
pub fn is_pin_candidate(author_is_bot: bool, content: &str, prefix: &str) -> bool {
    !author_is_bot && !content.starts_with(prefix)
}

pub fn format_pin_list(contents: &[&str]) -> String {
    if contents.is_empty() {
        return "No pinned messages in this channel.".to_string();
    }

    let mut response = String::from("**📌 Pinned Messages:**\n");
    for (i, content) in contents.iter().enumerate() {
        response.push_str(&format!("{}️⃣ {}\n", i + 1, preview(content)));
    }
    response
}

fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let cut: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        content.to_string()
    }
}

fn unpin_index(pinned: usize, number: Option<usize>) -> Option<usize> {
    number.filter(|n| (1..=pinned).contains(n)).map(|n| n - 1)
}

fn is_forbidden(error: &serenity::Error) -> bool {
    matches!(
        error,
        serenity::Error::Http(http_err) if http_err.status_code().map(|s| s.as_u16()) == Some(403)
    )
}

/// `a or b, c` -> `["a", "b", "c"]`.
pub fn split_choices(raw: &str) -> Vec<String> {
    raw.replace(',', " or ")
        .split(" or ")
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn choose_reply(raw: Option<&str>, prefix: &str) -> String {
    let Some(raw) = raw else {
        return format!(
            "❓ Please ask in this format: `{}choose option1 or option2`",
            prefix
        );
    };

    let options = split_choices(raw);
    if options.len() < 2 {
        return format!(
            "❗ You need to provide at least two options (e.g., `{}choose cat or dog`).",
            prefix
        );
    }

    let choice = options
        .choose(&mut rand::thread_rng())
        .unwrap_or(&options[0]);
    format!("🎲 I choose **{}**!", choice)
}
