use serde::{Deserialize, Serialize};

/// A voice the synthesizer can speak with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Display name (e.g. "Microsoft Sabina - Spanish (Bolivia)")
    pub name: String,

    /// BCP-47 style locale tag (e.g. "es-BO")
    pub lang: String,
}

/// Pick the best voice for a target locale
///
/// Cascade: exact locale match, then a display name containing the region
/// hint, then any voice sharing the language prefix, then `None` (caller
/// falls back to the engine default).
pub fn select_voice<'a>(
    voices: &'a [Voice],
    locale: &str,
    region_hint: &str,
) -> Option<&'a Voice> {
    if let Some(exact) = voices
        .iter()
        .find(|v| v.lang.eq_ignore_ascii_case(locale))
    {
        return Some(exact);
    }

    if let Some(by_name) = voices.iter().find(|v| v.name.contains(region_hint)) {
        return Some(by_name);
    }

    let prefix = locale.split('-').next().unwrap_or(locale);
    voices.iter().find(|v| {
        v.lang
            .split('-')
            .next()
            .map(|p| p.eq_ignore_ascii_case(prefix))
            .unwrap_or(false)
    })
}
