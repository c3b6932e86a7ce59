// Integration tests for the animation player
//
// The sink records render order and timing; the paused clock makes the
// frame cadence exact.

use anyhow::Result;
use base64::Engine as _;
use lsb_client::transport::{
    AnimateResponse, Backend, CurrentResponse, HealthResponse, SignToTextResponse, StopResponse,
};
use lsb_client::{AnimationPlayer, AnimationSequence, FrameSink};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

#[derive(Default)]
struct RecordingSink {
    renders: Mutex<Vec<(usize, Instant)>>,
    blanks: AtomicUsize,
}

impl FrameSink for RecordingSink {
    fn render(&self, index: usize, _jpeg: &[u8]) -> Result<()> {
        self.renders.lock().unwrap().push((index, Instant::now()));
        Ok(())
    }

    fn blank(&self) -> Result<()> {
        self.blanks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn b64(frame: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(frame)
}

fn response(frame_count: usize, fps: f32) -> AnimateResponse {
    let frames: Vec<String> = (0..frame_count)
        .map(|i| b64(format!("jpeg-{}", i).as_bytes()))
        .collect();
    serde_json::from_value(serde_json::json!({
        "frames": frames,
        "fps": fps,
        "glosa_final": "HOLA",
        "tokens": ["HOLA"],
        "total_frames": frame_count,
    }))
    .unwrap()
}

fn sequence(frame_count: usize, fps: f32) -> AnimationSequence {
    AnimationSequence::from_response(response(frame_count, fps)).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_frames_render_in_order_at_rate() {
    let sink = Arc::new(RecordingSink::default());
    let player = AnimationPlayer::new(sink.clone());

    let start = Instant::now();
    player.play(sequence(3, 24.0)).await.unwrap();

    while player.is_playing() {
        sleep(Duration::from_millis(1)).await;
    }
    let elapsed = start.elapsed();

    let renders = sink.renders.lock().unwrap();
    let order: Vec<usize> = renders.iter().map(|(i, _)| *i).collect();
    assert_eq!(order, vec![0, 1, 2]);

    let interval = Duration::from_secs_f64(1.0 / 24.0);
    for (i, (_, at)) in renders.iter().enumerate() {
        let expected = interval * i as u32;
        let actual = at.duration_since(start);
        let drift = if actual > expected {
            actual - expected
        } else {
            expected - actual
        };
        assert!(drift < Duration::from_millis(2), "frame {} drifted {:?}", i, drift);
    }

    // Total duration covers every frame's slot
    let total = interval * 3;
    assert!(elapsed >= total && elapsed < total + Duration::from_millis(10));
    assert!(!player.is_playing());

    player.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_second_play_rejected_while_active() {
    let sink = Arc::new(RecordingSink::default());
    let player = AnimationPlayer::new(sink.clone());

    player.play(sequence(10, 24.0)).await.unwrap();
    assert!(player.play(sequence(3, 24.0)).await.is_err());

    while player.is_playing() {
        sleep(Duration::from_millis(5)).await;
    }

    // After the last frame the slot frees up
    player.play(sequence(2, 24.0)).await.unwrap();
    player.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_clear_all_cancels_and_blanks() {
    let sink = Arc::new(RecordingSink::default());
    let player = AnimationPlayer::new(sink.clone());

    player.play(sequence(100, 24.0)).await.unwrap();
    sleep(Duration::from_millis(100)).await;
    assert!(player.is_playing());

    player.clear_all().await.unwrap();
    assert!(!player.is_playing());
    assert_eq!(player.position(), 0);
    assert_eq!(sink.blanks.load(Ordering::SeqCst), 1);

    let rendered = sink.renders.lock().unwrap().len();
    sleep(Duration::from_secs(10)).await;
    assert_eq!(
        sink.renders.lock().unwrap().len(),
        rendered,
        "no advance may fire after clear"
    );

    player.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_playback() {
    let sink = Arc::new(RecordingSink::default());
    let player = AnimationPlayer::new(sink.clone());

    player.play(sequence(1000, 24.0)).await.unwrap();
    sleep(Duration::from_millis(100)).await;
    player.shutdown().await;

    let rendered = sink.renders.lock().unwrap().len();
    sleep(Duration::from_secs(10)).await;
    assert_eq!(sink.renders.lock().unwrap().len(), rendered);
    assert!(rendered < 1000);
}

#[test]
fn test_sequence_validation() {
    assert!(AnimationSequence::from_response(response(0, 24.0)).is_err());
    assert!(AnimationSequence::from_response(response(3, 0.0)).is_err());
    assert!(AnimationSequence::from_response(response(3, -1.0)).is_err());

    let mut bad = response(2, 24.0);
    bad.frames[1] = "!!!not-base64!!!".to_string();
    assert!(AnimationSequence::from_response(bad).is_err());

    let seq = sequence(2, 25.0);
    assert_eq!(seq.frames[0], b"jpeg-0");
    assert_eq!(seq.frame_interval(), Duration::from_millis(40));
}

// --- one-shot request path ---

struct AnimatingBackend {
    animate_calls: AtomicUsize,

    /// Simulated generation time for `/animar`
    latency: Duration,
}

#[async_trait::async_trait]
impl Backend for AnimatingBackend {
    async fn health(&self) -> Result<HealthResponse> {
        Ok(HealthResponse {
            ok: true,
            device: "cpu".to_string(),
        })
    }
    async fn start(&self) -> Result<()> {
        Ok(())
    }
    async fn stop(&self) -> Result<StopResponse> {
        anyhow::bail!("not under test")
    }
    async fn clear(&self) -> Result<()> {
        Ok(())
    }
    async fn current(&self) -> Result<CurrentResponse> {
        anyhow::bail!("not under test")
    }
    async fn sign_to_text(&self, _frames: Vec<String>) -> Result<SignToTextResponse> {
        anyhow::bail!("not under test")
    }
    async fn animate(&self, _text: &str) -> Result<AnimateResponse> {
        self.animate_calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        Ok(response(3, 24.0))
    }
}

#[tokio::test(start_paused = true)]
async fn test_request_plays_and_busy_rejection_skips_backend() {
    let sink = Arc::new(RecordingSink::default());
    let player = AnimationPlayer::new(sink.clone());
    let backend = AnimatingBackend {
        animate_calls: AtomicUsize::new(0),
        latency: Duration::ZERO,
    };

    let seq = player.request(&backend, "hola").await.unwrap();
    assert_eq!(seq.gloss, "HOLA");
    assert_eq!(backend.animate_calls.load(Ordering::SeqCst), 1);

    // Busy: the backend must not even be asked
    assert!(player.request(&backend, "otra").await.is_err());
    assert_eq!(backend.animate_calls.load(Ordering::SeqCst), 1);

    while player.is_playing() {
        sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(sink.renders.lock().unwrap().len(), 3);

    player.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_requests_reach_backend_once() {
    let sink = Arc::new(RecordingSink::default());
    let player = Arc::new(AnimationPlayer::new(sink.clone()));
    let backend = Arc::new(AnimatingBackend {
        animate_calls: AtomicUsize::new(0),
        latency: Duration::from_secs(5),
    });

    let first = {
        let player = Arc::clone(&player);
        let backend = Arc::clone(&backend);
        tokio::spawn(async move { player.request(&*backend, "hola").await.map(|s| s.gloss) })
    };

    // The first request is still waiting on generation; the second must be
    // rejected without touching the backend
    sleep(Duration::from_millis(10)).await;
    assert!(player.request(&*backend, "otra").await.is_err());
    assert_eq!(backend.animate_calls.load(Ordering::SeqCst), 1);

    assert_eq!(first.await.unwrap().unwrap(), "HOLA");
    assert_eq!(backend.animate_calls.load(Ordering::SeqCst), 1);

    while player.is_playing() {
        sleep(Duration::from_millis(5)).await;
    }
}
