//! Helpers for testing the swarm tracker.
pub mod configuration;
pub mod random;
