use anyhow::Result;
use serenity::{http::Http, model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::{fs::File, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod audio;
mod bot;
mod config;
mod error;
mod sources;
mod ui;

use crate::audio::{player::AudioPlayer, transport::SongbirdTransport};
use crate::bot::JukeBot;
use crate::config::Config;
use crate::sources::YtDlpResolver;
use crate::ui::SerenityChat;

#[tokio::main]
async fn main() -> Result<()> {
    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    // Cargar configuración
    let config = Arc::new(Config::load()?);

    init_logging(&config)?;
    info!("🎵 Iniciando jukebot v{}", env!("CARGO_PKG_VERSION"));
    info!("{}", config.summary());

    // Verificar yt-dlp antes de conectar
    let resolver = Arc::new(YtDlpResolver::new(
        config.ytdlp_path.clone(),
        config.resolve_timeout,
    ));
    match resolver.verify().await {
        Ok(version) => info!("✅ yt-dlp {} disponible", version),
        Err(e) => warn!("⚠️ yt-dlp no responde, las búsquedas fallarán: {:?}", e),
    }

    // Configurar intents mínimos necesarios
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    // Audio: songbird + player
    let songbird = Songbird::serenity();
    let http = Arc::new(Http::new(&config.discord_token));
    let player = AudioPlayer::start(
        Arc::new(SongbirdTransport::new(songbird.clone())),
        Arc::new(SerenityChat::new(http)),
        config.max_queue_size,
    );

    // Crear handler del bot
    let handler = JukeBot::new(config.clone(), player, resolver)?;

    // Construir cliente
    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("⚠️ Señal de shutdown recibida, cerrando...");
                shard_manager.shutdown_all().await;
            }
            Err(e) => error!("Error al registrar Ctrl+C: {:?}", e),
        }
    });

    // Iniciar bot
    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}

/// stdout por defecto; con `LOG_FILE` escribe al archivo, sin colores.
fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("jukebot=debug".parse()?)
        .add_directive("serenity=info".parse()?)
        .add_directive("songbird=info".parse()?);

    match &config.log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    Ok(())
}

async fn health_check() -> Result<()> {
    dotenvy::dotenv().ok();
    let ytdlp_path = std::env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string());

    // Verificar dependencias críticas
    let yt_dlp = async_process::Command::new(&ytdlp_path)
        .arg("--version")
        .output()
        .await?;

    if yt_dlp.status.success() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("Dependencias faltantes: {}", ytdlp_path);
    }
}
