//! Configuration, errors, shared state and events
pub mod config;
pub mod error;
pub mod event;
pub mod state;
