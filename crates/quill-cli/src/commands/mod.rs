//! Command handlers.

pub mod account;
pub mod misc;
pub mod notes;
