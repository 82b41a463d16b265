use anyhow::Context;
use async_process::Command;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::{sync::Semaphore, time::timeout};
use tracing::{debug, info, warn};

use super::{Track, TrackResolver};
use crate::error::PlaybackError;

const UNKNOWN_TITLE: &str = "Unknown title";

/// Resolver que ejecuta yt-dlp fuera de proceso.
pub struct YtDlpResolver {
    binary: String,
    timeout: Duration,
    // Limitar procesos concurrentes de yt-dlp
    rate_limiter: Semaphore,
}

/// Campos de `--dump-json` que nos interesan.
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    url: Option<String>,
}

impl YtDlpResolver {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            rate_limiter: Semaphore::new(3),
        }
    }

    /// Verifica que yt-dlp esté disponible
    pub async fn verify(&self) -> anyhow::Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .with_context(|| format!("Error al ejecutar {}", self.binary))?;

        if !output.status.success() {
            anyhow::bail!("{} --version terminó con {}", self.binary, output.status);
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!("✅ yt-dlp versión: {}", version);
        Ok(version)
    }

    async fn run(&self, target: &str) -> Result<String, PlaybackError> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| PlaybackError::ResolutionFailed(e.to_string()))?;

        let mut cmd = Command::new(&self.binary);
        cmd.args([
            "-f",
            "bestaudio/best",
            "--no-playlist",
            "--dump-json",
            "--no-warnings",
            "--quiet",
            "--geo-bypass",
            "--force-ipv4",
            "--no-check-certificates",
            target,
        ])
        .kill_on_drop(true);

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("❌ No se pudo ejecutar yt-dlp: {}", e);
                return Err(PlaybackError::ResolutionFailed(format!(
                    "could not run {}",
                    self.binary
                )));
            }
            Err(_) => {
                warn!("⏰ yt-dlp excedió {:?} para: {}", self.timeout, target);
                return Err(PlaybackError::ResolutionFailed("search timed out".into()));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("❌ yt-dlp error: {}", stderr.trim());
            return Err(PlaybackError::ResolutionFailed("search failed".into()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> Result<Track, PlaybackError> {
        let target = search_target(query);
        info!("🔍 Buscando: {}", target);

        let stdout = self.run(&target).await?;
        let track = parse_dump_json(&stdout)?;

        debug!("🎵 Resuelto '{}' -> {}", query, track.title);
        Ok(track)
    }
}

/// Los links http(s) van directo a yt-dlp; todo lo demás es una búsqueda.
fn search_target(query: &str) -> String {
    let query = query.trim();
    match url::Url::parse(query) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => query.to_string(),
        _ => format!("ytsearch1:{}", query),
    }
}

fn parse_dump_json(stdout: &str) -> Result<Track, PlaybackError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| PlaybackError::ResolutionFailed("no results".into()))?;

    let info: YtDlpInfo = serde_json::from_str(line)
        .map_err(|e| PlaybackError::ResolutionFailed(format!("malformed response: {}", e)))?;

    let stream_url = info
        .url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| PlaybackError::ResolutionFailed("no audio stream found".into()))?;

    Ok(Track {
        title: info.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        stream_url,
    })
}
