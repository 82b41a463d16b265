//! Parseo de comandos con prefijo.
//!
//! Los comandos son mensajes de chat comunes, como `*play never gonna give you up`.
//! Solo la primera palabra elige el comando; el resto es el argumento, sin
//! espacios sobrantes. Los saludos se reconocen por el comienzo del mensaje en
//! minúsculas, así que `*hello!` y `*heyyy` también cuentan.

/// Comando de chat dirigido al bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `play <query>`. Una query vacía se conserva para que el handler explique el uso.
    Play(String),
    Queue,
    Pause,
    Resume,
    Skip,
    Stop,
    Loop,
    Pin,
    PinList,
    /// `unpin <n>`, `None` si falta el número o no es un número.
    Unpin(Option<usize>),
    Choose(Option<String>),
    Help,
    Hello,
    Bye,
}

/// Parsea `content` si empieza con `prefix`. Comandos desconocidos dan `None`.
pub fn parse(prefix: &str, content: &str) -> Option<Command> {
    let body = content.trim_start().strip_prefix(prefix)?;
    let lowered = body.to_lowercase();

    // saludos: basta con el comienzo del mensaje
    if lowered.starts_with("hello") || lowered.starts_with("hey") {
        return Some(Command::Hello);
    }
    if lowered.starts_with("bye") {
        return Some(Command::Bye);
    }

    let body = body.trim();
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };

    let command = match name.to_lowercase().as_str() {
        "play" | "p" => Command::Play(rest.to_string()),
        "queue" | "q" => Command::Queue,
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "skip" => Command::Skip,
        "stop" => Command::Stop,
        "loop" => Command::Loop,
        "pin" if rest.eq_ignore_ascii_case("list") => Command::PinList,
        "pin" => Command::Pin,
        "pinlist" => Command::PinList,
        "unpin" => Command::Unpin(rest.split_whitespace().next().and_then(|n| n.parse().ok())),
        "choose" => Command::Choose(Some(rest.to_string()).filter(|r| !r.is_empty())),
        "help" => Command::Help,
        _ => return None,
    };

    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_play_with_query() {
        assert_eq!(
            parse("*", "*play  never gonna give you up "),
            Some(Command::Play("never gonna give you up".into()))
        );
        assert_eq!(parse("*", "*PLAY lofi"), Some(Command::Play("lofi".into())));
        assert_eq!(parse("*", "*play"), Some(Command::Play(String::new())));
    }

    #[test]
    fn ignores_messages_without_prefix() {
        assert_eq!(parse("*", "play lofi"), None);
        assert_eq!(parse("!", "*play lofi"), None);
        assert_eq!(parse("*", "*dance"), None);
    }

    #[test]
    fn parses_playback_commands() {
        let cases = [
            ("*queue", Command::Queue),
            ("*pause", Command::Pause),
            ("*resume", Command::Resume),
            ("*skip", Command::Skip),
            ("*stop", Command::Stop),
            ("*loop", Command::Loop),
            ("*help", Command::Help),
        ];
        for (input, expected) in cases {
            assert_eq!(parse("*", input), Some(expected), "input: {}", input);
        }
    }

    #[test]
    fn pin_list_alias() {
        assert_eq!(parse("*", "*pin"), Some(Command::Pin));
        assert_eq!(parse("*", "*pinlist"), Some(Command::PinList));
        assert_eq!(parse("*", "*pin list"), Some(Command::PinList));
    }

    #[test]
    fn unpin_number() {
        assert_eq!(parse("*", "*unpin 2"), Some(Command::Unpin(Some(2))));
        assert_eq!(parse("*", "*unpin"), Some(Command::Unpin(None)));
        assert_eq!(parse("*", "*unpin two"), Some(Command::Unpin(None)));
    }

    #[test]
    fn choose_keeps_raw_choices() {
        assert_eq!(
            parse("*", "*choose cat or dog"),
            Some(Command::Choose(Some("cat or dog".into())))
        );
        assert_eq!(parse("*", "*choose"), Some(Command::Choose(None)));
    }

    #[test]
    fn greetings_match_message_start() {
        assert_eq!(parse("*", "*hello there"), Some(Command::Hello));
        assert_eq!(parse("*", "*Hey!"), Some(Command::Hello));
        assert_eq!(parse("*", "*bye"), Some(Command::Bye));
    }
}
