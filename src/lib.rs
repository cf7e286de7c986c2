//! Deadline tracking for real-estate and land-use matters.
//!
//! The crate backs the `deadline-tracker` binary: a reminder dispatcher that
//! emails clients ahead of their deadlines, an Asana reconciler that turns
//! project tasks into deadlines, and a seeder for the standard deadline types.

pub mod channels;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod integrations;
pub mod legal;
pub mod settings;
