//! Database models mapping the SQLite schema to domain entities.

pub mod appointment;
#[cfg(feature = "server")]
pub mod auth;
pub mod clinic;
pub mod config;
pub mod finance;
pub mod lead;
pub mod medical;
pub mod member;
pub mod patient;
pub mod professional;
