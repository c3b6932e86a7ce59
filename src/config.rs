use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub session: SessionConfig,
    pub heartbeat: HeartbeatConfig,
    pub narration: NarrationConfig,
    pub animation: AnimationConfig,
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the recognition backend
    pub url: String,

    /// Deadline for session/control calls, in seconds
    pub request_timeout_secs: u64,

    /// Deadline for inference calls (sign-to-text, animation), in seconds
    pub inference_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    /// Interval between /current fetches while a session is running
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatConfig {
    /// Interval between /health probes
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NarrationConfig {
    /// Target voice locale (e.g. "es-BO")
    pub locale: String,

    /// Region name to look for in voice display names when no exact
    /// locale match exists
    pub region_hint: String,

    /// Per-character speaking allowance, in milliseconds
    pub char_ms: u64,

    /// Fixed gap between sentences, in milliseconds
    pub gap_ms: u64,

    /// Speaking rate passed to the synthesizer
    pub rate: f32,

    /// Pitch passed to the synthesizer
    pub pitch: f32,
}

#[derive(Debug, Deserialize)]
pub struct AnimationConfig {
    /// Directory where rendered animation frames are written
    pub output_dir: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            locale: "es-BO".to_string(),
            region_hint: "Bolivia".to_string(),
            char_ms: 35,
            gap_ms: 600,
            rate: 1.0,
            pitch: 1.0,
        }
    }
}
