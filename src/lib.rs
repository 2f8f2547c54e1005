//! Round-robin style league scheduling.
//!
//! Builds weekly matchups for a fixed set of entities so that every pair
//! meets the required number of times, repeats are spaced out, and pinned
//! weeks are kept. Many candidate schedules are generated with a randomized
//! backtracking search, validated independently, scored against a list of
//! desired matchups and ranked.
//!
//! # Modules
//!
//! - **`schedule`**: the search engine, validator, scorer and run controller
//! - **`parser`**: text loaders for entities, requirements, pins and desired matchups
//! - **`config`**: TOML configuration
//! - **`display`**, **`export`**: console, CSV and HTML rendering
//! - **`web`**: JSON API around the run controller

pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod parser;
pub mod schedule;
pub mod web;

pub use error::{Result, SchedulerError};
