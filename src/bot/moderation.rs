//! Filtro de palabras prohibidas.

use rand::seq::SliceRandom;
use regex::Regex;
use serenity::model::{id::UserId, mention::Mentionable};

const RESPONSES: [&str; 4] = [
    "you bad bad boy!",
    "You dirty boy!",
    "tsk tsk, hindi pwede yan!",
    "huwag ganun, please!",
];

/// Detecta palabras prohibidas como palabras completas, sin distinguir mayúsculas.
#[derive(Debug, Clone)]
pub struct ModerationFilter {
    pattern: Option<Regex>,
}

impl ModerationFilter {
    /// Con una lista vacía el filtro nunca detecta nada.
    pub fn new(words: &[String]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn is_offensive(&self, content: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(content))
    }

    /// Respuesta al autor, elegida al azar.
    pub fn scold(&self, author: UserId) -> String {
        let response = RESPONSES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(RESPONSES[0]);
        format!("{}, {}", author.mention(), response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(words: &[&str]) -> ModerationFilter {
        let words: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        ModerationFilter::new(&words).unwrap()
    }

    #[test]
    fn matches_whole_words_only() {
        let filter = filter(&["bobo", "idiot"]);

        assert!(filter.is_offensive("ang bobo mo"));
        assert!(filter.is_offensive("You IDIOT!"));
        assert!(!filter.is_offensive("idiotic"));
        assert!(!filter.is_offensive("boboto"));
        assert!(!filter.is_offensive("hello there"));
    }

    #[test]
    fn words_are_literal() {
        let filter = filter(&["a.b"]);

        assert!(filter.is_offensive("a.b"));
        assert!(!filter.is_offensive("axb"));
    }

    #[test]
    fn empty_list_never_matches() {
        let filter = filter(&["", "  "]);
        assert!(!filter.is_offensive("anything at all"));
    }

    #[test]
    fn scold_mentions_author() {
        let reply = filter(&["bobo"]).scold(UserId::new(42));

        let (mention, response) = reply.split_once(", ").unwrap();
        assert_eq!(mention, "<@42>");
        assert!(RESPONSES.contains(&response));
    }
}
