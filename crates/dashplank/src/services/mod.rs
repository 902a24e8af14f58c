//! GIO-backed services: the collaborators the core reconciles between,
//! and the daemon plumbing around them.

pub mod bridge;
pub mod config_manager;
pub mod dock;
pub mod favorites;
pub mod launcher;
pub mod notify;
pub mod settings;
pub mod shell;
pub mod theme;
