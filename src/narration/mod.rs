//! Sentence-paced narration of finished translations
//!
//! The scheduler splits a translation into sentences, assigns each one a
//! speaking offset, and drives an injected [`SpeechSynthesizer`]. Exactly
//! one narration queue may be active; new queues cancel the old one first.

mod engine;
mod queue;
mod scheduler;
mod voice;

pub use engine::{SidecarSynthesizer, SpeechSynthesizer, Utterance};
pub use queue::{build_queue, NarrationItem};
pub use scheduler::NarrationScheduler;
pub use voice::{select_voice, Voice};
