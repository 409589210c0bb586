//! Services module
//!
//! Coordination on top of the repository: idempotent social actions,
//! daily puzzle publication and profile views.

pub mod daily;
pub mod profiles;
pub mod social;

pub use daily::{DailyOutcome, DailyPuzzleService};
pub use profiles::{ProfileService, PuzzleView, UserProfile};
pub use social::{Ack, SocialService};
