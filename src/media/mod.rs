pub mod catalog;
pub mod config;
pub mod engine;
pub mod errors;
pub mod guard;
pub mod playback;
pub mod types;
