pub mod api;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod scheduler;
pub mod setup;
pub mod state;
pub mod terminal;
pub mod wallet;
