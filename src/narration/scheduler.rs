use super::engine::{SpeechSynthesizer, Utterance};
use super::queue::build_queue;
use super::voice::select_voice;
use crate::config::NarrationConfig;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

struct ActiveQueue {
    token: CancellationToken,
    task: JoinHandle<()>,
}

struct Inner {
    active: Option<ActiveQueue>,

    /// Translation behind the current/last queue, kept for replay
    last_translation: Option<String>,
}

/// Paces synthesized speech over the sentences of a finished translation
///
/// At most one queue is active. Scheduling a new queue cancels every
/// pending timer and any in-progress utterance of the previous one before
/// anything new is scheduled; both steps happen under one lock, so no
/// interleaving of two queues is observable.
pub struct NarrationScheduler {
    engine: Arc<dyn SpeechSynthesizer>,
    config: NarrationConfig,
    inner: Mutex<Inner>,
}

impl NarrationScheduler {
    pub fn new(engine: Arc<dyn SpeechSynthesizer>, config: NarrationConfig) -> Self {
        Self {
            engine,
            config,
            inner: Mutex::new(Inner {
                active: None,
                last_translation: None,
            }),
        }
    }

    /// Cancel whatever is pending and narrate this translation from the
    /// first sentence
    pub async fn schedule(&self, translation: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        self.cancel_active(&mut inner).await;
        inner.last_translation = Some(translation.to_string());
        self.spawn_queue(&mut inner, translation).await
    }

    /// Restart the last translation's queue from sentence 0
    pub async fn replay(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let translation = match inner.last_translation.clone() {
            Some(t) => t,
            None => {
                info!("Nothing to replay");
                return Ok(());
            }
        };

        self.cancel_active(&mut inner).await;
        self.spawn_queue(&mut inner, &translation).await
    }

    /// Silence everything: pending timers, in-progress speech, and the
    /// replay slot, so a later replay stays quiet
    pub async fn cancel(&self) {
        let mut inner = self.inner.lock().await;
        self.cancel_active(&mut inner).await;
        inner.last_translation = None;
    }

    async fn cancel_active(&self, inner: &mut Inner) {
        if let Some(active) = inner.active.take() {
            active.token.cancel();
            if let Err(e) = active.task.await {
                error!("Narration task panicked: {}", e);
            }
        }

        // The engine is process-wide; cut off any utterance it still holds
        if let Err(e) = self.engine.cancel().await {
            warn!("Engine cancel failed: {:#}", e);
        }
    }

    async fn spawn_queue(&self, inner: &mut Inner, translation: &str) -> Result<()> {
        let queue = build_queue(translation, &self.config);
        if queue.is_empty() {
            info!("Translation has no speakable sentences");
            return Ok(());
        }

        let voice = match self.engine.voices().await {
            Ok(voices) => select_voice(&voices, &self.config.locale, &self.config.region_hint)
                .map(|v| v.name.clone()),
            Err(e) => {
                // Engine default still speaks
                warn!("Voice listing failed: {:#}", e);
                None
            }
        };

        info!(
            "Narrating {} sentence(s) with voice {:?}",
            queue.len(),
            voice
        );

        let engine = Arc::clone(&self.engine);
        let rate = self.config.rate;
        let pitch = self.config.pitch;
        let token = CancellationToken::new();
        let queue_token = token.clone();

        let task = tokio::spawn(async move {
            let started = Instant::now();

            for item in queue {
                tokio::select! {
                    _ = queue_token.cancelled() => return,
                    _ = tokio::time::sleep_until(started + item.delay) => {}
                }

                let utterance = Utterance {
                    text: item.text,
                    voice: voice.clone(),
                    rate,
                    pitch,
                };

                if let Err(e) = engine.speak(&utterance).await {
                    warn!("Utterance failed: {:#}", e);
                }
            }
        });

        inner.active = Some(ActiveQueue { token, task });
        Ok(())
    }
}
