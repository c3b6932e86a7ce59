use serde::{Deserialize, Serialize};

/// Response from `GET /health`
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    /// Whether the backend considers itself ready
    pub ok: bool,

    /// Inference device reported by the backend (e.g. "cuda:0", "cpu")
    #[serde(default)]
    pub device: String,
}

/// Response from `GET /stop`
///
/// The backend refines the raw recognition history into a final sentence
/// (T5 + LLM pass on its side) and returns it here.
#[derive(Debug, Clone, Deserialize)]
pub struct StopResponse {
    #[serde(rename = "traduccion_refinada", default)]
    pub refined_translation: String,
}

/// The sign currently being recognized, as reported by `GET /current`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentSign {
    /// Display label for the current sign ("Pausado" while nothing is detected)
    #[serde(default)]
    pub clean_text: String,

    /// Confidence in [0, 1]
    #[serde(default)]
    pub prob: f32,

    /// Pre-formatted percentage string (e.g. "92.0%")
    #[serde(default)]
    pub prob_percent: String,
}

/// Response from `GET /current`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentResponse {
    #[serde(default)]
    pub current: CurrentSign,

    /// Base64 JPEG of the processed camera frame, or empty when no signal
    #[serde(default)]
    pub frame: String,

    /// Accumulated recognitions, one `"LABEL (NN.N%)"` string per entry
    #[serde(default)]
    pub history: Vec<String>,
}

/// Request body for `POST /sign-to-text`
#[derive(Debug, Clone, Serialize)]
pub struct SignToTextRequest {
    /// Base64 JPEG frames, in capture order
    pub frames_b64: Vec<String>,
}

/// Response from `POST /sign-to-text`
#[derive(Debug, Clone, Deserialize)]
pub struct SignToTextResponse {
    pub text: String,
    #[serde(default)]
    pub latency_ms: f64,
}

/// Request body for `POST /animar`
#[derive(Debug, Clone, Serialize)]
pub struct AnimateRequest {
    #[serde(rename = "frase")]
    pub phrase: String,
}

/// Response from `POST /animar`
#[derive(Debug, Clone, Deserialize)]
pub struct AnimateResponse {
    /// Base64 JPEG frames, in playback order
    #[serde(default)]
    pub frames: Vec<String>,

    /// Target playback rate
    #[serde(default)]
    pub fps: f32,

    /// Final gloss sequence the animation was generated from
    #[serde(rename = "glosa_final", default)]
    pub final_gloss: String,

    /// Individual gloss tokens
    #[serde(default)]
    pub tokens: Vec<String>,

    #[serde(default)]
    pub total_frames: usize,
}
