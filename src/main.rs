use anyhow::{Context, Result};
use avatar_sync::headless::{HeadlessAssets, LogRenderer, TimedOutput};
use avatar_sync::{AvatarView, Collaborators, Config, HttpBackend, OutgoingMessage, PcmClip};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "avatar-sync")]
#[command(about = "Drive the talking avatar headlessly against a chat backend")]
struct Args {
    /// Config file (TOML); missing files fall back to defaults
    #[arg(short, long, default_value = "config/avatar-sync")]
    config: String,

    /// Text message to send
    #[arg(short, long)]
    message: Option<String>,

    /// WAV recording to send as a voice message
    #[arg(long, conflicts_with = "message")]
    voice: Option<PathBuf>,

    /// Override backend.base_url
    #[arg(long)]
    backend_url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut cfg = Config::load(&args.config)?;
    if let Some(url) = args.backend_url {
        cfg.backend.base_url = url;
    }
    cfg.validate()?;

    info!("Avatar Sync v{}", env!("CARGO_PKG_VERSION"));
    info!("Chat backend: {}", cfg.backend.base_url);
    info!(
        "Idle pose after {}s, toggling every {}s",
        cfg.inactivity.delay_secs, cfg.inactivity.toggle_period_secs
    );

    let voice = match &args.voice {
        Some(path) => {
            let wav = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let clip = PcmClip::from_wav_bytes(&wav)
                .with_context(|| format!("{} is not a usable WAV file", path.display()))?;
            info!(
                "Voice message: {:.1}s at {}Hz",
                clip.duration().as_secs_f32(),
                clip.sample_rate
            );
            Some(wav)
        }
        None => None,
    };

    let turn = match (args.message, voice) {
        (Some(text), _) => OutgoingMessage::Text(text),
        (None, Some(wav)) => OutgoingMessage::Voice(wav),
        (None, None) => {
            warn!("Nothing to send; pass --message or --voice");
            return Ok(());
        }
    };

    let backend = HttpBackend::new(&cfg.backend).context("Failed to create chat backend client")?;
    let collaborators = Collaborators {
        backend: Arc::new(backend),
        output: Arc::new(TimedOutput),
        assets: Arc::new(HeadlessAssets::new(cfg.animation.clone())),
        renderer: Box::new(LogRenderer::new(cfg.render.fps)),
    };

    let (view, handle) = AvatarView::new(cfg, collaborators);
    let view_task = tokio::spawn(view.run());

    match turn {
        OutgoingMessage::Text(text) => handle.send_text(text).await?,
        OutgoingMessage::Voice(wav) => handle.send_voice(wav).await?,
    }

    let status = handle.wait_for(|s| s.turns_completed >= 1).await?;
    info!("Turn complete, animation back to {}", status.animation);

    handle.close().await?;
    view_task.await.context("Avatar view panicked")??;

    Ok(())
}
