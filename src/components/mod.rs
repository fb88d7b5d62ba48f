//! # Built-in leaves of the assistant.
//!
//! Thin components that sit on the routing core: a terminal, a file manager
//! and a sound queue, plus the [`default_topology`] wiring them under two
//! hubs. Their workers use an [`Outbox`] to talk to the routers by name.

mod files;
mod hub;
mod outbox;
mod sound;
mod terminal;
mod topology;

pub use files::FileManager;
pub use hub::hub;
pub use outbox::Outbox;
pub use sound::{playback, playback_with, SoundManager, SoundQueue, Utterance, VOICES};
pub use terminal::{terminal_input, TerminalInput, TerminalManager};
pub use topology::default_topology;

/// Registry names of the built-in routers.
pub mod names {
    pub const GLADOS: &str = "Glados";
    pub const AUTO: &str = "Auto";
    pub const TERMINAL_MANAGER: &str = "TerminalManager";
    pub const FILE_MANAGER: &str = "FileManager";
    pub const SOUND_MANAGER: &str = "SoundManager";
}
