use anyhow::{Context, Result};
use base64::Engine;
use clap::{Parser, Subcommand};
use lsb_client::{
    build_queue, format_history, AnimationPlayer, Backend, Config, DirSink, HeartbeatMonitor,
    HttpBackend, Liveness, NarrationScheduler, RemoteCamera, SessionController, SidecarSynthesizer,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "lsb-client")]
#[command(about = "Client for the LSB sign-language recognition backend")]
struct Args {
    /// Config file (without extension), loaded via the config crate
    #[arg(short, long, default_value = "config/default")]
    config: String,

    /// Override the backend base URL from the config file
    #[arg(long)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe the backend once and report liveness
    Health,

    /// Run a bounded recognition session and print the refined translation
    Session {
        /// How long to keep the session running, in seconds
        #[arg(short, long, default_value = "30")]
        duration: u64,

        /// Speech sidecar binary; when set, the translation is narrated
        #[arg(long)]
        tts_sidecar: Option<String>,
    },

    /// Generate a sign animation for a phrase and play it into a directory
    Animate {
        text: String,

        /// Output directory for rendered frames (defaults to config)
        #[arg(long)]
        out: Option<String>,
    },

    /// Submit captured JPEG frames for one-shot recognition
    SignToText {
        /// Frame files, in capture order
        frames: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(url) = args.backend_url {
        cfg.backend.url = url;
    }

    let backend = Arc::new(HttpBackend::new(
        &cfg.backend.url,
        cfg.backend.request_timeout(),
        cfg.backend.inference_timeout(),
    ));

    match args.command {
        Command::Health => {
            let monitor = HeartbeatMonitor::start(
                backend.clone(),
                Duration::from_secs(cfg.heartbeat.interval_secs),
            );

            // Give the first probe a moment to land
            let mut rx = monitor.subscribe();
            rx.changed().await.ok();
            let status = monitor.status();
            match status.liveness {
                Liveness::Alive => info!(
                    "Backend alive on {}",
                    status.device.unwrap_or_else(|| "unknown device".into())
                ),
                Liveness::Dead => warn!("Backend unavailable"),
                Liveness::Unknown => warn!("No probe completed"),
            }

            monitor.shutdown().await;
        }

        Command::Session {
            duration,
            tts_sidecar,
        } => {
            let monitor = HeartbeatMonitor::start(
                backend.clone(),
                Duration::from_secs(cfg.heartbeat.interval_secs),
            );

            let narration = match tts_sidecar {
                Some(program) => {
                    let engine = Arc::new(SidecarSynthesizer::spawn(&program)?);
                    Some(Arc::new(NarrationScheduler::new(
                        engine,
                        cfg.narration.clone(),
                    )))
                }
                None => None,
            };

            let controller = SessionController::new(
                backend.clone(),
                Arc::new(RemoteCamera),
                narration.clone(),
                Duration::from_millis(cfg.session.poll_interval_ms),
            )?;

            controller.toggle().await?;
            info!("Session running for {} second(s)", duration);
            sleep(Duration::from_secs(duration)).await;

            let stats = controller.stats().await;
            info!(
                "Recognized {} sign(s) in {:.1}s",
                stats.recognized, stats.duration_secs
            );

            controller.toggle().await?;

            let state = controller.state().await;
            if let Some(translation) = &state.final_translation {
                println!("{}", translation);
            }
            if !state.history.is_empty() {
                println!("{}", format_history(&state.history));
            }

            // Let a narration queue finish before tearing everything down
            if narration.is_some() {
                if let Some(translation) = &state.final_translation {
                    let queue = build_queue(translation, &cfg.narration);
                    if let Some(last) = queue.last() {
                        let tail = Duration::from_millis(
                            last.text.chars().count() as u64 * cfg.narration.char_ms
                                + cfg.narration.gap_ms,
                        );
                        sleep(last.delay + tail).await;
                    }
                }
            }

            controller.shutdown().await;
            monitor.shutdown().await;
        }

        Command::Animate { text, out } => {
            let dir = out.unwrap_or_else(|| cfg.animation.output_dir.clone());
            let sink = Arc::new(DirSink::new(dir)?);
            let player = AnimationPlayer::new(sink);

            let sequence = player.request(backend.as_ref(), &text).await?;
            println!(
                "{} frame(s) at {} fps, gloss: {}",
                sequence.frames.len(),
                sequence.fps,
                sequence.gloss
            );

            while player.is_playing() {
                sleep(Duration::from_millis(50)).await;
            }
            player.shutdown().await;
        }

        Command::SignToText { frames } => {
            if frames.is_empty() {
                anyhow::bail!("No frame files given");
            }

            let mut frames_b64 = Vec::with_capacity(frames.len());
            for path in &frames {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Failed to read frame {}", path))?;
                frames_b64.push(base64::engine::general_purpose::STANDARD.encode(bytes));
            }

            let resp = backend.sign_to_text(frames_b64).await?;
            println!("{}", resp.text);
            info!("Recognized in {:.0} ms", resp.latency_ms);
        }
    }

    Ok(())
}
