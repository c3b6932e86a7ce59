use super::types::*;
use super::Backend;
use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// JSON-over-HTTP implementation of [`Backend`]
///
/// Every call races the full request/parse against a logical deadline.
/// When the deadline wins the future is dropped, so a response that
/// arrives late can never be applied to client state.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,

    /// Deadline for session/control calls
    request_timeout: Duration,

    /// Deadline for inference calls (sign-to-text, animation generation)
    inference_timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, request_timeout: Duration, inference_timeout: Duration) -> Self {
        info!("Backend client for {}", base_url);

        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout,
            inference_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn deadline<T>(
        &self,
        limit: Duration,
        path: &str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => anyhow::bail!("{} timed out after {:?}", path, limit),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = async {
            let response = self
                .client
                .get(self.url(path))
                .send()
                .await
                .with_context(|| format!("request to {} failed", path))?;

            response
                .error_for_status()
                .with_context(|| format!("{} returned an error status", path))?
                .json::<T>()
                .await
                .with_context(|| format!("{} returned an unparseable body", path))
        };

        self.deadline(self.request_timeout, path, request).await
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        limit: Duration,
    ) -> Result<T> {
        let request = async {
            let response = self
                .client
                .post(self.url(path))
                .json(body)
                .send()
                .await
                .with_context(|| format!("request to {} failed", path))?;

            response
                .error_for_status()
                .with_context(|| format!("{} returned an error status", path))?
                .json::<T>()
                .await
                .with_context(|| format!("{} returned an unparseable body", path))
        };

        self.deadline(limit, path, request).await
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn health(&self) -> Result<HealthResponse> {
        self.get_json("/health").await
    }

    async fn start(&self) -> Result<()> {
        // Body is an empty object; nothing to keep
        let _: serde_json::Value = self.get_json("/start").await?;
        Ok(())
    }

    async fn stop(&self) -> Result<StopResponse> {
        self.get_json("/stop").await
    }

    async fn clear(&self) -> Result<()> {
        let _: serde_json::Value = self.get_json("/clear").await?;
        Ok(())
    }

    async fn current(&self) -> Result<CurrentResponse> {
        self.get_json("/current").await
    }

    async fn sign_to_text(&self, frames_b64: Vec<String>) -> Result<SignToTextResponse> {
        let body = SignToTextRequest { frames_b64 };
        self.post_json("/sign-to-text", &body, self.inference_timeout)
            .await
    }

    async fn animate(&self, text: &str) -> Result<AnimateResponse> {
        let body = AnimateRequest {
            phrase: text.to_string(),
        };
        self.post_json("/animar", &body, self.inference_timeout)
            .await
    }
}
