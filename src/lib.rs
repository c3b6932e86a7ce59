pub mod animation;
pub mod config;
pub mod heartbeat;
pub mod narration;
pub mod session;
pub mod transport;

pub use animation::{AnimationPlayer, AnimationSequence, DirSink, FrameSink};
pub use config::Config;
pub use heartbeat::{BackendStatus, HeartbeatMonitor, Liveness};
pub use narration::{
    build_queue, select_voice, NarrationItem, NarrationScheduler, SidecarSynthesizer,
    SpeechSynthesizer, Utterance, Voice,
};
pub use session::{
    format_history, parse_history, CaptureDevice, HistoryEntry, RemoteCamera, SessionController,
    SessionPhase, SessionState, SessionStats,
};
pub use transport::{Backend, HttpBackend};
