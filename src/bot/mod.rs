//! # Módulo Bot
//!
//! Lado Discord de jukebot.
//!
//! [`JukeBot`] implementa el [`EventHandler`] de Serenity:
//!
//! - `message`: filtro de palabras, luego comandos con prefijo ([`commands::parse`])
//! - `ready`: log de arranque
//! - `voice_state_update`: cierra la sesión del guild cuando alguien más
//!   desconecta al bot de voz
//!
//! Los comandos de reproducción pasan por [`handlers::playback_reply`], que
//! solo necesita el [`AudioPlayer`] y un [`TrackResolver`]. Los comandos de
//! pines y `choose` viven en [`pins`].

use anyhow::Result;
use serenity::{
    all::{Context, EventHandler, Message, Ready, VoiceState},
    async_trait,
    builder::CreateMessage,
    model::mention::Mentionable,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub mod commands;
pub mod handlers;
pub mod moderation;
pub mod pins;

use self::{
    commands::Command,
    handlers::Invocation,
    moderation::ModerationFilter,
};
use crate::{audio::player::AudioPlayer, config::Config, sources::TrackResolver, ui::embeds};

pub struct JukeBot {
    config: Arc<Config>,
    player: Arc<AudioPlayer>,
    resolver: Arc<dyn TrackResolver>,
    moderation: ModerationFilter,
}

impl JukeBot {
    pub fn new(
        config: Arc<Config>,
        player: Arc<AudioPlayer>,
        resolver: Arc<dyn TrackResolver>,
    ) -> Result<Self> {
        let moderation = ModerationFilter::new(&config.banned_words)?;

        Ok(Self {
            config,
            player,
            resolver,
            moderation,
        })
    }

    /// Borra el mensaje ofensivo y regaña al autor.
    async fn moderate(&self, ctx: &Context, msg: &Message) -> Result<()> {
        info!("🚫 Mensaje filtrado de {} en {}", msg.author.name, msg.channel_id);

        if let Err(e) = msg.delete(ctx).await {
            warn!("No se pudo borrar el mensaje de {}: {:?}", msg.author.name, e);
        }

        msg.channel_id
            .say(&ctx.http, self.moderation.scold(msg.author.id))
            .await?;
        Ok(())
    }

    async fn run_command(&self, ctx: &Context, msg: &Message, command: Command) -> Result<()> {
        let prefix = self.config.command_prefix.as_str();
        let Some(guild_id) = msg.guild_id else {
            debug!("Comando {:?} ignorado fuera de un servidor", command);
            return Ok(());
        };

        info!(
            "📝 Comando {:?} usado por {} en guild {}",
            command, msg.author.name, guild_id
        );

        let reply = match &command {
            Command::Hello => format!("Sup {}!", msg.author.mention()),
            Command::Bye => "Bye 👋".to_string(),
            Command::Help => {
                msg.channel_id
                    .send_message(&ctx.http, CreateMessage::new().embed(embeds::help()))
                    .await?;
                return Ok(());
            }
            Command::Pin => pins::pin_previous(&ctx.http, msg, prefix).await,
            Command::PinList => pins::list_pins(&ctx.http, msg).await,
            Command::Unpin(number) => pins::unpin(&ctx.http, msg, *number, prefix).await,
            Command::Choose(raw) => pins::choose_reply(raw.as_deref(), prefix),
            _ => {
                let voice_channel = match &command {
                    Command::Play(_) => {
                        handlers::author_voice_channel(ctx, guild_id, msg.author.id)
                    }
                    _ => None,
                };
                let invocation = Invocation {
                    guild_id,
                    text_channel: msg.channel_id,
                    voice_channel,
                };

                match handlers::playback_reply(&self.player, self.resolver.as_ref(), invocation, &command)
                    .await
                {
                    Some(reply) => reply,
                    None => return Ok(()),
                }
            }
        };

        msg.channel_id.say(&ctx.http, reply).await?;
        Ok(())
    }
}

#[async_trait]
impl EventHandler for JukeBot {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        if self.moderation.is_offensive(&msg.content) {
            if let Err(e) = self.moderate(&ctx, &msg).await {
                error!("Error al moderar mensaje: {:?}", e);
            }
            return;
        }

        let Some(command) = commands::parse(&self.config.command_prefix, &msg.content) else {
            return;
        };

        if let Err(e) = self.run_command(&ctx, &msg, command).await {
            error!("Error al ejecutar comando: {:?}", e);
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("✅ {} está conectado!", ready.user.name);
        info!("🏠 Servidores: {}", ready.guilds.len());
        info!("⌨️ Prefijo de comandos: {}", self.config.command_prefix);
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        if new.user_id != ctx.cache.current_user().id {
            return;
        }

        let Some(guild_id) = new.guild_id else {
            return;
        };

        let was_connected = old.and_then(|state| state.channel_id).is_some();
        if was_connected && new.channel_id.is_none() {
            info!("🔌 Bot desconectado de voz en guild {}", guild_id);
            self.player.voice_lost(guild_id).await;
        }
    }
}
