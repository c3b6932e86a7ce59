use super::voice::Voice;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// One synthesized utterance
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,

    /// Voice name; `None` uses the engine default
    pub voice: Option<String>,

    pub rate: f32,
    pub pitch: f32,
}

/// The process-wide speech engine, modeled as a single owned collaborator
///
/// Exactly one component may have pending speech at a time; callers are
/// expected to `cancel()` before handing the engine new work.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Voices the engine can speak with
    async fn voices(&self) -> Result<Vec<Voice>>;

    /// Begin speaking; returns once the utterance is accepted, not once it
    /// finishes
    async fn speak(&self, utterance: &Utterance) -> Result<()>;

    /// Stop any in-progress or pending speech
    async fn cancel(&self) -> Result<()>;
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SidecarRequest<'a> {
    Voices,
    Speak {
        text: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        voice: Option<&'a str>,
        rate: f32,
        pitch: f32,
    },
    Cancel,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SidecarResponse {
    Ok,
    Error { message: String },
    Voices { voices: Vec<Voice> },
}

struct SidecarIo {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Speech engine running as a child process
///
/// The sidecar speaks line-delimited JSON: one request object per line on
/// stdin, one response object per line on stdout. Keeping synthesis in a
/// separate process keeps its native audio stack out of this one.
pub struct SidecarSynthesizer {
    child: Mutex<Child>,
    io: Mutex<SidecarIo>,
}

impl SidecarSynthesizer {
    pub fn spawn(program: &str) -> Result<Self> {
        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn speech sidecar '{}'", program))?;

        let stdin = child
            .stdin
            .take()
            .context("Speech sidecar has no stdin")?;
        let stdout = child
            .stdout
            .take()
            .map(BufReader::new)
            .context("Speech sidecar has no stdout")?;

        info!("Speech sidecar started: {}", program);

        Ok(Self {
            child: Mutex::new(child),
            io: Mutex::new(SidecarIo { stdin, stdout }),
        })
    }

    async fn round_trip(&self, request: &SidecarRequest<'_>) -> Result<SidecarResponse> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');

        let mut io = self.io.lock().await;
        io.stdin
            .write_all(line.as_bytes())
            .await
            .context("Failed to write to speech sidecar")?;
        io.stdin.flush().await?;

        let mut reply = String::new();
        let read = io
            .stdout
            .read_line(&mut reply)
            .await
            .context("Failed to read from speech sidecar")?;
        if read == 0 {
            anyhow::bail!("Speech sidecar closed its stdout");
        }

        let response: SidecarResponse =
            serde_json::from_str(reply.trim()).context("Unparseable sidecar response")?;

        if let SidecarResponse::Error { message } = &response {
            anyhow::bail!("Speech sidecar error: {}", message);
        }

        Ok(response)
    }

    /// Ask the sidecar to exit; kills it if it will not
    pub async fn shutdown(self) {
        let mut child = self.child.into_inner();
        if let Err(e) = child.kill().await {
            warn!("Speech sidecar did not die cleanly: {}", e);
        }
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for SidecarSynthesizer {
    async fn voices(&self) -> Result<Vec<Voice>> {
        match self.round_trip(&SidecarRequest::Voices).await? {
            SidecarResponse::Voices { voices } => Ok(voices),
            _ => Ok(Vec::new()),
        }
    }

    async fn speak(&self, utterance: &Utterance) -> Result<()> {
        self.round_trip(&SidecarRequest::Speak {
            text: &utterance.text,
            voice: utterance.voice.as_deref(),
            rate: utterance.rate,
            pitch: utterance.pitch,
        })
        .await?;
        Ok(())
    }

    async fn cancel(&self) -> Result<()> {
        self.round_trip(&SidecarRequest::Cancel).await?;
        Ok(())
    }
}
