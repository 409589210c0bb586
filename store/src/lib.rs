//! Klotski store library
//!
//! Persistence model for the Klotski puzzle-sharing platform: users,
//! puzzles, the follow graph, likes, solve attempts and the puzzle of the
//! day, with every integrity rule enforced by the schema.

pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod slug;

pub use config::StoreConfig;
pub use database::Repository;
pub use error::{Result, StoreError};
