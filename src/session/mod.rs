//! Recognition session management
//!
//! This module provides the `SessionController` abstraction that manages:
//! - The run/idle lifecycle against the backend (`/start`, `/stop`, `/clear`)
//! - The polling loop that publishes live recognition samples
//! - Client-side parsing of the backend's history strings
//! - The capture-device lease held for the controller's lifetime

mod camera;
mod controller;
mod state;

pub use camera::{CameraLease, CaptureDevice, RemoteCamera};
pub use controller::SessionController;
pub use state::{
    format_history, parse_history, HistoryEntry, SessionPhase, SessionState, SessionStats,
    IDLE_LABEL,
};
