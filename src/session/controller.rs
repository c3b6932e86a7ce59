use super::camera::{CameraLease, CaptureDevice};
use super::state::{parse_history, SessionPhase, SessionState, SessionStats, IDLE_LABEL};
use crate::narration::NarrationScheduler;
use crate::transport::{Backend, CurrentResponse};
use anyhow::{Context, Result};
use base64::Engine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Fallback translation when the backend detected nothing
const NO_DETECTION: &str = "No se detectó nada.";

/// Shown when the stop response could not be obtained or parsed
const TRANSLATION_ERROR: &str = "No se pudo obtener la traducción.";

struct PollHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the run/idle lifecycle of one recognition session
///
/// While Running, a polling task fetches `/current` every ~100 ms and
/// publishes the sample into [`SessionState`]. Stopping cancels the task's
/// token first, so at most one already-in-flight fetch may still resolve,
/// and its result is discarded.
pub struct SessionController {
    /// Identifier used in logs only
    id: String,

    backend: Arc<dyn Backend>,
    narration: Option<Arc<NarrationScheduler>>,
    poll_interval: Duration,

    state: Arc<RwLock<SessionState>>,

    /// Present exactly while phase is Running
    poll: Mutex<Option<PollHandle>>,

    /// Cancelled when the controller itself is torn down
    lifetime: CancellationToken,

    camera: CameraLease,
}

impl SessionController {
    /// Acquire the capture device and build an idle controller
    pub fn new(
        backend: Arc<dyn Backend>,
        camera: Arc<dyn CaptureDevice>,
        narration: Option<Arc<NarrationScheduler>>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let camera = CameraLease::acquire(camera).context("Failed to acquire capture device")?;
        let id = format!("session-{}", uuid::Uuid::new_v4());

        info!("Created {}", id);

        Ok(Self {
            id,
            backend,
            narration,
            poll_interval,
            state: Arc::new(RwLock::new(SessionState::default())),
            poll: Mutex::new(None),
            lifetime: CancellationToken::new(),
            camera,
        })
    }

    /// Snapshot of the current session state
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.read().await.phase
    }

    pub async fn stats(&self) -> SessionStats {
        let state = self.state.read().await;
        // After a stop the duration is the span of the last Running phase,
        // not time-since-start
        let end = state.stopped_at.unwrap_or_else(chrono::Utc::now);
        let duration_secs = state
            .started_at
            .map(|t| {
                let elapsed = end.signed_duration_since(t);
                elapsed.num_milliseconds() as f64 / 1000.0
            })
            .unwrap_or(0.0);

        SessionStats {
            phase: state.phase,
            started_at: state.started_at,
            duration_secs,
            recognized: state.history.len(),
        }
    }

    /// Flip between Idle and Running; returns the phase after the flip
    pub async fn toggle(&self) -> Result<SessionPhase> {
        let mut poll = self.poll.lock().await;

        if poll.is_none() {
            self.begin(&mut poll).await?;
            Ok(SessionPhase::Running)
        } else {
            self.finish(&mut poll).await;
            Ok(SessionPhase::Idle)
        }
    }

    /// Idle → Running: start the backend session and the polling task
    async fn begin(&self, poll: &mut Option<PollHandle>) -> Result<()> {
        self.backend
            .start()
            .await
            .context("Backend refused to start the session")?;

        {
            let mut state = self.state.write().await;
            state.reset_recognition();
            state.phase = SessionPhase::Running;
            state.started_at = Some(chrono::Utc::now());
            state.stopped_at = None;
        }

        let token = self.lifetime.child_token();
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.backend),
            Arc::clone(&self.state),
            token.clone(),
            self.poll_interval,
        ));

        *poll = Some(PollHandle { token, task });

        info!("{} running", self.id);
        Ok(())
    }

    /// Running → Idle: unconditional, even when /stop misbehaves
    async fn finish(&self, poll: &mut Option<PollHandle>) {
        let handle = match poll.take() {
            Some(handle) => handle,
            None => return,
        };

        // Cancel before the stop round-trip so the loop issues no further
        // fetches while we wait
        handle.token.cancel();

        let translation = match self.backend.stop().await {
            Ok(resp) if resp.refined_translation.trim().is_empty() => NO_DETECTION.to_string(),
            Ok(resp) => resp.refined_translation,
            Err(e) => {
                error!("Stop response unusable: {:#}", e);
                TRANSLATION_ERROR.to_string()
            }
        };

        if let Err(e) = handle.task.await {
            error!("Polling task panicked: {}", e);
        }

        {
            let mut state = self.state.write().await;
            state.phase = SessionPhase::Idle;
            state.current_label = IDLE_LABEL.to_string();
            state.confidence = 0.0;
            state.frame = None;
            state.final_translation = Some(translation.clone());
            state.stopped_at = Some(chrono::Utc::now());
        }

        info!("{} stopped: {}", self.id, translation);

        if let Some(narration) = &self.narration {
            if let Err(e) = narration.schedule(&translation).await {
                warn!("Narration failed to schedule: {:#}", e);
            }
        }
    }

    /// Reset backend and local history; callable in either phase
    pub async fn clear(&self) -> Result<()> {
        if let Err(e) = self.backend.clear().await {
            // Local reset still proceeds; the UI must come back clean
            warn!("Backend clear failed: {:#}", e);
        }

        {
            let mut state = self.state.write().await;
            state.history.clear();
            state.final_translation = None;
        }

        if let Some(narration) = &self.narration {
            narration.cancel().await;
        }

        info!("{} cleared", self.id);
        Ok(())
    }

    /// Tear down: stop any running session, release the capture device
    pub async fn shutdown(self) {
        self.lifetime.cancel();

        let mut poll = self.poll.lock().await;
        if let Some(handle) = poll.take() {
            if let Err(e) = handle.task.await {
                error!("Polling task panicked: {}", e);
            }
        }
        drop(poll);

        if let Some(narration) = &self.narration {
            narration.cancel().await;
        }

        self.camera.release();
        info!("{} shut down", self.id);
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        // The camera lease releases itself; the polling task must not
        // outlive the controller either
        self.lifetime.cancel();
    }
}

/// Fetch `/current` until cancelled
///
/// The token is checked at the top of every iteration and again after each
/// fetch resolves, so a sample that was in flight when the session stopped
/// is discarded rather than applied.
async fn poll_loop(
    backend: Arc<dyn Backend>,
    state: Arc<RwLock<SessionState>>,
    token: CancellationToken,
    interval: Duration,
) {
    info!("Polling loop started");

    loop {
        if token.is_cancelled() {
            break;
        }

        match backend.current().await {
            Ok(sample) => {
                if token.is_cancelled() {
                    break;
                }
                apply_sample(&state, sample).await;
            }
            Err(e) => {
                // Transient: retried on the next tick, never surfaced
                warn!("Polling fetch failed: {:#}", e);
            }
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    info!("Polling loop stopped");
}

async fn apply_sample(state: &RwLock<SessionState>, sample: CurrentResponse) {
    let frame = if sample.frame.is_empty() {
        None
    } else {
        match base64::engine::general_purpose::STANDARD.decode(&sample.frame) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Dropping undecodable frame: {}", e);
                None
            }
        }
    };

    let history = parse_history(&sample.history);

    let mut state = state.write().await;
    state.current_label = if sample.current.clean_text.is_empty() {
        IDLE_LABEL.to_string()
    } else {
        sample.current.clean_text
    };
    state.confidence = sample.current.prob.clamp(0.0, 1.0);
    state.frame = frame;
    state.history = history;
}
