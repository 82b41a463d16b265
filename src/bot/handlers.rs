use serenity::{
    model::id::{ChannelId, GuildId, UserId},
    prelude::Context,
};
use tracing::{info, warn};

use super::commands::Command;
use crate::{
    audio::player::{AudioPlayer, Enqueued, PlayRequest, StopOutcome},
    error::PlaybackError,
    sources::TrackResolver,
    ui::embeds,
};

/// Origen de un comando.
#[derive(Debug, Clone, Copy)]
pub struct Invocation {
    pub guild_id: GuildId,
    pub text_channel: ChannelId,
    /// Canal de voz del autor al momento del comando
    pub voice_channel: Option<ChannelId>,
}

/// Ejecuta un comando de reproducción y devuelve la respuesta para el chat.
///
/// `None` si el comando no es de reproducción.
pub async fn playback_reply(
    player: &AudioPlayer,
    resolver: &dyn TrackResolver,
    invocation: Invocation,
    command: &Command,
) -> Option<String> {
    let guild_id = invocation.guild_id;

    let result = match command {
        Command::Play(query) if query.is_empty() => {
            Ok("❓ Please tell me what to play (e.g. a song name or a link).".to_string())
        }
        Command::Play(query) => play(player, resolver, invocation, query)
            .await
            .map(|enqueued| format!("🎶 Added to queue: {}", enqueued.title)),
        Command::Queue => Ok(queue_reply(player, guild_id).await),
        Command::Pause => player
            .pause(guild_id)
            .await
            .map(|()| "⏸ Music paused.".to_string()),
        Command::Resume => player
            .resume(guild_id)
            .await
            .map(|()| "▶ Music resumed.".to_string()),
        Command::Skip => player
            .skip(guild_id)
            .await
            .map(|()| "⏭ Skipped the current song!".to_string()),
        Command::Stop => Ok(match player.stop(guild_id).await {
            StopOutcome::Stopped => "🛑 Stopped music and cleared the queue.",
            StopOutcome::NotActive => "No music is playing to stop!",
        }
        .to_string()),
        Command::Loop => player.toggle_loop(guild_id).await.map(|enabled| {
            if enabled {
                "🔁 Loop enabled.".to_string()
            } else {
                "➡️ Loop disabled.".to_string()
            }
        }),
        _ => return None,
    };

    Some(result.unwrap_or_else(|e| {
        if !e.is_user_precondition() {
            warn!("❌ {:?} falló en guild {}: {}", command, guild_id, e);
        }
        e.to_string()
    }))
}

/// Resuelve `query` y lo agrega a la cola del guild.
///
/// El ticket se toma antes de resolver: un `stop` que llega mientras yt-dlp
/// sigue corriendo convierte el resultado en [`PlaybackError::Cancelled`].
pub async fn play(
    player: &AudioPlayer,
    resolver: &dyn TrackResolver,
    invocation: Invocation,
    query: &str,
) -> Result<Enqueued, PlaybackError> {
    let voice_channel = invocation
        .voice_channel
        .ok_or(PlaybackError::NotInVoiceChannel)?;

    let ticket = player.ticket(invocation.guild_id);
    info!("🔍 Buscando '{}' para guild {}", query, invocation.guild_id);
    let track = resolver.resolve(query).await?;

    let request = PlayRequest {
        ticket,
        voice_channel,
        text_channel: invocation.text_channel,
    };
    player.enqueue(request, track).await
}

async fn queue_reply(player: &AudioPlayer, guild_id: GuildId) -> String {
    player
        .snapshot(guild_id)
        .await
        .and_then(|snapshot| embeds::queue_listing(&snapshot))
        .unwrap_or_else(|| "🎶 The queue is empty!".to_string())
}

/// Canal de voz del usuario según la caché de serenity.
pub fn author_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    let guild = guild_id.to_guild_cached(&ctx.cache)?;
    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::testing::{settle, track, FakeTransport, RecordingChat, TransportCall},
        sources::{MockTrackResolver, Track},
    };
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const GUILD: GuildId = GuildId::new(7);
    const VOICE: ChannelId = ChannelId::new(70);
    const TEXT: ChannelId = ChannelId::new(71);

    fn invocation() -> Invocation {
        Invocation {
            guild_id: GUILD,
            text_channel: TEXT,
            voice_channel: Some(VOICE),
        }
    }

    fn setup() -> (Arc<AudioPlayer>, Arc<FakeTransport>) {
        let transport = Arc::new(FakeTransport::default());
        let player = AudioPlayer::start(transport.clone(), Arc::new(RecordingChat::default()), 10);
        (player, transport)
    }

    fn echo_resolver() -> MockTrackResolver {
        let mut resolver = MockTrackResolver::new();
        resolver.expect_resolve().returning(|query| Ok(track(query)));
        resolver
    }

    async fn reply(player: &AudioPlayer, resolver: &dyn TrackResolver, command: Command) -> String {
        playback_reply(player, resolver, invocation(), &command)
            .await
            .unwrap()
    }

    /// Simula un `stop` que llega mientras yt-dlp sigue resolviendo.
    struct StopWhileResolving {
        player: Arc<AudioPlayer>,
    }

    #[async_trait]
    impl TrackResolver for StopWhileResolving {
        async fn resolve(&self, query: &str) -> Result<Track, PlaybackError> {
            self.player.stop(GUILD).await;
            Ok(track(query))
        }
    }

    #[tokio::test]
    async fn play_replies_with_added_title() {
        let (player, transport) = setup();
        let resolver = echo_resolver();

        let text = reply(&player, &resolver, Command::Play("lofi beats".into())).await;

        assert_eq!(text, "🎶 Added to queue: lofi beats");
        assert_eq!(transport.plays(GUILD), vec![track("lofi beats").stream_url]);
    }

    #[tokio::test]
    async fn play_requires_voice_channel() {
        let (player, transport) = setup();
        let mut resolver = MockTrackResolver::new();
        resolver.expect_resolve().never();

        let invocation = Invocation {
            voice_channel: None,
            ..invocation()
        };
        let result = play(&player, &resolver, invocation, "lofi").await;

        assert_eq!(result, Err(PlaybackError::NotInVoiceChannel));
        assert!(transport.calls(GUILD).is_empty());
    }

    #[tokio::test]
    async fn resolution_failure_is_reported() {
        let (player, transport) = setup();
        let mut resolver = MockTrackResolver::new();
        resolver
            .expect_resolve()
            .times(1)
            .returning(|_| Err(PlaybackError::ResolutionFailed("no results".into())));

        let text = reply(&player, &resolver, Command::Play("asdfgh".into())).await;

        assert_eq!(text, "Couldn't find anything to play: no results");
        assert!(!player.is_active(GUILD));
        assert!(transport.calls(GUILD).is_empty());
    }

    #[tokio::test]
    async fn empty_play_explains_usage() {
        let (player, _) = setup();
        let mut resolver = MockTrackResolver::new();
        resolver.expect_resolve().never();

        let text = reply(&player, &resolver, Command::Play(String::new())).await;
        assert!(text.starts_with("❓"));
    }

    #[tokio::test]
    async fn stop_while_resolving_cancels_the_play() {
        let (player, transport) = setup();
        let resolver = StopWhileResolving {
            player: Arc::clone(&player),
        };

        let result = play(&player, &resolver, invocation(), "lofi").await;

        assert_eq!(result, Err(PlaybackError::Cancelled));
        assert!(!player.is_active(GUILD));
        assert_eq!(transport.count(GUILD, &TransportCall::Connect(VOICE)), 0);
    }

    #[tokio::test]
    async fn playback_command_replies() {
        let (player, _) = setup();
        let resolver = echo_resolver();

        assert_eq!(reply(&player, &resolver, Command::Pause).await, "Nothing is playing right now!");
        assert_eq!(reply(&player, &resolver, Command::Skip).await, "No music is playing to skip!");
        assert_eq!(reply(&player, &resolver, Command::Loop).await, "No music is playing to loop!");
        assert_eq!(reply(&player, &resolver, Command::Stop).await, "No music is playing to stop!");
        assert_eq!(reply(&player, &resolver, Command::Queue).await, "🎶 The queue is empty!");

        reply(&player, &resolver, Command::Play("song A".into())).await;
        reply(&player, &resolver, Command::Play("song B".into())).await;

        assert_eq!(reply(&player, &resolver, Command::Loop).await, "🔁 Loop enabled.");
        assert_eq!(reply(&player, &resolver, Command::Loop).await, "➡️ Loop disabled.");
        assert_eq!(reply(&player, &resolver, Command::Pause).await, "⏸ Music paused.");
        assert_eq!(reply(&player, &resolver, Command::Resume).await, "▶ Music resumed.");
        assert_eq!(reply(&player, &resolver, Command::Resume).await, "Music isn’t paused!");
        assert_eq!(
            reply(&player, &resolver, Command::Queue).await,
            "**🎵 Current Queue:**\n1. ▶ song A\n2. 🎶 song B\n"
        );
        assert_eq!(reply(&player, &resolver, Command::Skip).await, "⏭ Skipped the current song!");
        settle().await;
        assert_eq!(
            reply(&player, &resolver, Command::Stop).await,
            "🛑 Stopped music and cleared the queue."
        );
        assert!(!player.is_active(GUILD));
    }

    #[tokio::test]
    async fn non_playback_commands_are_ignored() {
        let (player, _) = setup();
        let resolver = MockTrackResolver::new();
        assert_eq!(playback_reply(&player, &resolver, invocation(), &Command::Help).await, None);
    }
}
