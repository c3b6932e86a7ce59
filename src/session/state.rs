use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Suffix the recognizer appends to labels that came from its automatic
/// clip-trimming pass; display strips it
const TRIMMED_LABEL_SUFFIX: &str = "_recortados_auto";

/// Label shown while nothing is being recognized
pub const IDLE_LABEL: &str = "Pausado";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    Running,
}

/// One recognized sign, in recognition order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Display label, internal tokenization suffix already stripped
    pub label: String,

    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl HistoryEntry {
    /// Parse a backend history string of the form `"LABEL (NN.N%)"`
    ///
    /// Returns `None` for strings that do not follow the format; the
    /// backend occasionally emits placeholders while warming up.
    pub fn parse(raw: &str) -> Option<Self> {
        let (label, rest) = raw.split_once(" (")?;
        let percent = rest.strip_suffix("%)")?.trim().parse::<f32>().ok()?;

        let label = label
            .strip_suffix(TRIMMED_LABEL_SUFFIX)
            .unwrap_or(label)
            .to_string();

        Some(Self {
            label,
            confidence: (percent / 100.0).clamp(0.0, 1.0),
        })
    }

    /// Display form, `"LABEL (NN.N%)"`
    pub fn display(&self) -> String {
        format!("{} ({:.1}%)", self.label, self.confidence * 100.0)
    }
}

/// Parse every well-formed entry of a backend history list, order preserved
pub fn parse_history(raw: &[String]) -> Vec<HistoryEntry> {
    raw.iter().filter_map(|s| HistoryEntry::parse(s)).collect()
}

/// Join history entries into the arrow-separated display string
pub fn format_history(history: &[HistoryEntry]) -> String {
    history
        .iter()
        .map(HistoryEntry::display)
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Everything the session controller knows about the current session
///
/// Owned by the controller; mutated only by the polling task and by
/// `toggle`/`clear`.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: SessionPhase,

    /// Label of the sign currently being recognized
    pub current_label: String,

    /// Confidence of the current sign, in [0, 1]
    pub confidence: f32,

    /// Last processed camera frame (decoded JPEG), if any
    pub frame: Option<Vec<u8>>,

    /// Recognitions so far, append-only while Running
    pub history: Vec<HistoryEntry>,

    /// Refined translation published when the session stops
    pub final_translation: Option<String>,

    /// When the current (or last) Running phase began
    pub started_at: Option<DateTime<Utc>>,

    /// When the last Running phase ended; `None` while Running
    pub stopped_at: Option<DateTime<Utc>>,
}

/// Snapshot of session progress, for display and logging
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub phase: SessionPhase,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_secs: f64,

    /// Signs recognized so far
    pub recognized: usize,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            current_label: IDLE_LABEL.to_string(),
            confidence: 0.0,
            frame: None,
            history: Vec::new(),
            final_translation: None,
            started_at: None,
            stopped_at: None,
        }
    }
}

impl SessionState {
    /// Reset everything except the phase
    pub fn reset_recognition(&mut self) {
        self.current_label = IDLE_LABEL.to_string();
        self.confidence = 0.0;
        self.frame = None;
        self.history.clear();
        self.final_translation = None;
    }
}
