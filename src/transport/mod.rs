//! Backend transport
//!
//! The recognition backend is a JSON-over-HTTP service. Everything that
//! talks to it goes through the [`Backend`] trait so the session
//! controller, heartbeat monitor and animation player can be driven by a
//! fake in tests.

mod http;
mod types;

pub use http::HttpBackend;
pub use types::{
    AnimateRequest, AnimateResponse, CurrentResponse, CurrentSign, HealthResponse,
    SignToTextRequest, SignToTextResponse, StopResponse,
};

use anyhow::Result;

/// Client-side contract for the recognition backend
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Liveness probe
    async fn health(&self) -> Result<HealthResponse>;

    /// Begin a recognition session
    async fn start(&self) -> Result<()>;

    /// End the session; the response carries the refined translation
    async fn stop(&self) -> Result<StopResponse>;

    /// Reset the backend's accumulated history
    async fn clear(&self) -> Result<()>;

    /// Fetch the current recognition sample
    async fn current(&self) -> Result<CurrentResponse>;

    /// Submit captured frames for one-shot recognition
    async fn sign_to_text(&self, frames_b64: Vec<String>) -> Result<SignToTextResponse>;

    /// Generate a sign animation for a phrase
    async fn animate(&self, text: &str) -> Result<AnimateResponse>;
}
