//! Control surface: operator input, event translation and presentation

pub mod console;
pub mod control;
pub mod handlers;
pub mod presentation;

pub use console::ConsoleSurface;
pub use control::{ControlPoll, ControlSurface, EpochTracker, Tab};
pub use handlers::{Command, ControlSurfaceAdapter};
pub use presentation::{LogPresenter, PresentationCache, Presenter};
