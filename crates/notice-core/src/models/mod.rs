//! Data models and configuration.

pub mod config;
pub mod notice;
pub mod roster;
