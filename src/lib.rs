pub mod bot;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod poller;
pub mod service;
pub mod telegram;
pub mod update;

pub use poller::{Poller, PollerConfig};
pub use update::{Update, UpdateBatch, UpdateHandler, UpdateKind, UpdateMessage, UpdateSource};
