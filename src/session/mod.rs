//! Mode selection and transfer session lifecycle

pub mod manager;
pub mod mode;

pub use manager::{ModeChange, Session, SessionManager, SessionState, StartOutcome};
pub use mode::Mode;
