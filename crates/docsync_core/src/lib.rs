pub mod config;
pub mod differ;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod model;
pub mod prompt;
pub mod pull;
pub mod push;
pub mod remote;
pub mod selection;
pub mod store;

#[cfg(test)]
mod testing;

pub use engine::{SyncOptions, Syncer};
pub use error::{SyncError, sync_error};
pub use pull::{PullAction, PullReport};
pub use push::{PushOutcome, PushReport};
