use super::sink::FrameSink;
use crate::transport::{AnimateResponse, Backend};
use anyhow::{Context, Result};
use base64::Engine;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// A server-generated frame sequence, ready to play
#[derive(Debug, Clone)]
pub struct AnimationSequence {
    /// Decoded JPEG frames in playback order
    pub frames: Vec<Vec<u8>>,

    /// Target playback rate, always positive
    pub fps: f32,

    /// Gloss sequence the animation was generated from
    pub gloss: String,

    pub tokens: Vec<String>,
}

impl AnimationSequence {
    /// Decode an `/animar` response; rejects empty or undecodable frame
    /// lists and non-positive rates
    pub fn from_response(resp: AnimateResponse) -> Result<Self> {
        if resp.frames.is_empty() {
            anyhow::bail!("Animation response carried no frames");
        }
        if resp.fps <= 0.0 {
            anyhow::bail!("Animation response carried fps {}", resp.fps);
        }

        let mut frames = Vec::with_capacity(resp.frames.len());
        for (i, b64) in resp.frames.iter().enumerate() {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(b64)
                .with_context(|| format!("Frame {} is not valid base64", i))?;
            frames.push(bytes);
        }

        Ok(Self {
            frames,
            fps: resp.fps,
            gloss: resp.final_gloss,
            tokens: resp.tokens,
        })
    }

    /// Time between frame advances
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps as f64)
    }
}

struct Playback {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Replays a server-supplied frame sequence at its target rate
///
/// One sequence at a time: a new request while one is playing is rejected,
/// not queued. Playback is a single loop in one task carrying its own
/// cancellation token, so teardown is just cancelling that token.
pub struct AnimationPlayer {
    sink: Arc<dyn FrameSink>,
    playing: Arc<AtomicBool>,

    /// Held from request entry through the whole generation round-trip,
    /// so overlapping requests never reach the backend
    requesting: AtomicBool,

    position: Arc<AtomicUsize>,
    inner: Mutex<Option<Playback>>,
    lifetime: CancellationToken,
}

impl AnimationPlayer {
    pub fn new(sink: Arc<dyn FrameSink>) -> Self {
        Self {
            sink,
            playing: Arc::new(AtomicBool::new(false)),
            requesting: AtomicBool::new(false),
            position: Arc::new(AtomicUsize::new(0)),
            inner: Mutex::new(None),
            lifetime: CancellationToken::new(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// Index of the frame most recently rendered
    pub fn position(&self) -> usize {
        self.position.load(Ordering::SeqCst)
    }

    /// One-shot: generate an animation for `text` and play it
    ///
    /// Rejected while a playback is active or another request is still
    /// waiting on generation; the backend is not even asked.
    pub async fn request(&self, backend: &dyn Backend, text: &str) -> Result<AnimationSequence> {
        if self.is_playing() || self.requesting.swap(true, Ordering::SeqCst) {
            anyhow::bail!("An animation is already playing");
        }

        let result = self.generate_and_play(backend, text).await;
        self.requesting.store(false, Ordering::SeqCst);
        result
    }

    async fn generate_and_play(
        &self,
        backend: &dyn Backend,
        text: &str,
    ) -> Result<AnimationSequence> {
        let resp = backend
            .animate(text)
            .await
            .context("Animation request failed")?;
        let sequence = AnimationSequence::from_response(resp)?;

        info!(
            "Generated {} frame(s) at {} fps for gloss '{}'",
            sequence.frames.len(),
            sequence.fps,
            sequence.gloss
        );

        self.play(sequence.clone()).await?;
        Ok(sequence)
    }

    /// Play a decoded sequence; rejected while one is already playing
    pub async fn play(&self, sequence: AnimationSequence) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if self.playing.load(Ordering::SeqCst) {
            anyhow::bail!("An animation is already playing");
        }

        // A finished playback may still hold its task slot
        if let Some(old) = inner.take() {
            old.token.cancel();
            if let Err(e) = old.task.await {
                error!("Playback task panicked: {}", e);
            }
        }

        self.playing.store(true, Ordering::SeqCst);
        self.position.store(0, Ordering::SeqCst);

        let sink = Arc::clone(&self.sink);
        let playing = Arc::clone(&self.playing);
        let position = Arc::clone(&self.position);
        let interval = sequence.frame_interval();
        let token = self.lifetime.child_token();
        let play_token = token.clone();

        let task = tokio::spawn(async move {
            for (index, frame) in sequence.frames.iter().enumerate() {
                if play_token.is_cancelled() {
                    break;
                }

                position.store(index, Ordering::SeqCst);
                if let Err(e) = sink.render(index, frame) {
                    warn!("Frame {} failed to render: {:#}", index, e);
                }

                tokio::select! {
                    _ = play_token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }

            playing.store(false, Ordering::SeqCst);
        });

        *inner = Some(Playback { token, task });
        Ok(())
    }

    /// Cancel any pending advance, forget the frames, blank the surface
    pub async fn clear_all(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if let Some(playback) = inner.take() {
            playback.token.cancel();
            if let Err(e) = playback.task.await {
                error!("Playback task panicked: {}", e);
            }
        }

        self.playing.store(false, Ordering::SeqCst);
        self.position.store(0, Ordering::SeqCst);
        self.sink.blank()?;

        info!("Animation surface cleared");
        Ok(())
    }

    /// Tear down; no playback may outlive the player
    pub async fn shutdown(self) {
        self.lifetime.cancel();

        let mut inner = self.inner.lock().await;
        if let Some(playback) = inner.take() {
            if let Err(e) = playback.task.await {
                error!("Playback task panicked: {}", e);
            }
        }
    }
}

impl Drop for AnimationPlayer {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}
