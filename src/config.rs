use anyhow::{Context, Result};
use std::{path::PathBuf, time::Duration};

/// Palabras filtradas si `BANNED_WORDS` no está definido.
const DEFAULT_BANNED_WORDS: [&str; 5] = ["bitch", "idiot", "tangina", "gago", "bobo"];

#[derive(Debug, Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub command_prefix: String,

    // Resolución
    pub ytdlp_path: String,
    pub resolve_timeout: Duration,

    // Límites
    pub max_queue_size: usize,

    // Moderación
    pub banned_words: Vec<String>,

    // Logging
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Carga `.env` (si existe) y luego lee el entorno del proceso.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construye la configuración desde cualquier búsqueda de claves. Los
    /// valores vacíos cuentan como no definidos.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Self {
            discord_token: var("DISCORD_TOKEN").context("DISCORD_TOKEN no está definido")?,
            command_prefix: var("COMMAND_PREFIX").unwrap_or_else(|| "*".to_string()),

            ytdlp_path: var("YTDLP_PATH").unwrap_or_else(|| "yt-dlp".to_string()),
            resolve_timeout: Duration::from_secs(
                var("RESOLVE_TIMEOUT_SECS")
                    .unwrap_or_else(|| "30".to_string())
                    .parse()
                    .context("RESOLVE_TIMEOUT_SECS inválido")?,
            ),

            max_queue_size: var("MAX_QUEUE_SIZE")
                .unwrap_or_else(|| "100".to_string())
                .parse()
                .context("MAX_QUEUE_SIZE inválido")?,

            banned_words: match var("BANNED_WORDS") {
                Some(list) => list
                    .split(',')
                    .map(|word| word.trim().to_lowercase())
                    .filter(|word| !word.is_empty())
                    .collect(),
                None => DEFAULT_BANNED_WORDS.iter().map(|w| w.to_string()).collect(),
            },

            log_file: var("LOG_FILE").map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Valida los valores de configuración.
    ///
    /// - El prefijo no puede contener espacios
    /// - El tamaño de cola y el timeout de resolución deben ser mayores a 0
    pub fn validate(&self) -> Result<()> {
        if self.command_prefix.chars().any(char::is_whitespace) {
            anyhow::bail!("Command prefix cannot contain whitespace, got: {:?}", self.command_prefix);
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if self.resolve_timeout.is_zero() {
            anyhow::bail!("Resolve timeout must be greater than 0");
        }

        Ok(())
    }

    /// Resumen de la configuración actual para el log.
    ///
    /// Nunca incluye el token.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Prefix: {}\n  \
            Resolver: {} ({}s timeout)\n  \
            Limits: {} queue\n  \
            Moderation: {} banned words\n  \
            Log: {}",
            self.command_prefix,
            self.ytdlp_path,
            self.resolve_timeout.as_secs(),
            self.max_queue_size,
            self.banned_words.len(),
            self.log_file
                .as_ref()
                .map_or("stdout".to_string(), |path| path.display().to_string()),
        )
    }
}
