use crate::config::NarrationConfig;
use std::time::Duration;

/// One sentence with its scheduled speaking offset from queue start
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationItem {
    /// Sentence text, terminated with a period
    pub text: String,

    /// Offset from queue start at which speaking begins
    pub delay: Duration,
}

/// Split a translation into paced sentences
///
/// Sentences end at `.`, `!` or `?`. Each retained sentence is trimmed and
/// re-terminated with a period. The first sentence speaks immediately;
/// each following one is offset by the previous sentence's length times
/// the per-character allowance, plus a fixed gap.
pub fn build_queue(translation: &str, pacing: &NarrationConfig) -> Vec<NarrationItem> {
    let mut items = Vec::new();
    let mut offset = Duration::ZERO;

    for raw in translation.split(['.', '!', '?']) {
        let sentence = raw.trim();
        if sentence.is_empty() {
            continue;
        }

        let text = format!("{}.", sentence);
        let speaking = Duration::from_millis(text.chars().count() as u64 * pacing.char_ms);

        items.push(NarrationItem {
            text,
            delay: offset,
        });

        offset += speaking + Duration::from_millis(pacing.gap_ms);
    }

    items
}
