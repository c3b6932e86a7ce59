//! Sign-animation playback
//!
//! A one-shot `/animar` request returns an ordered JPEG frame sequence and
//! a target rate; the player replays it into a [`FrameSink`] and stops
//! itself after the last frame.

mod player;
mod sink;

pub use player::{AnimationPlayer, AnimationSequence};
pub use sink::{DirSink, FrameSink};
