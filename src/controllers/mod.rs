//! Controllers shipped with the crate

pub mod health;

pub use health::HealthController;
