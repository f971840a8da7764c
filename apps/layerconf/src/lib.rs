//! # Layerconf
//!
//! Adapter around `layerconf-core`: configuration file, CLI and HTTP API.
//!
//! - `api`: axum router over one selection session
//! - `cli`: clap commands (`server`, `status`, `resolve`)
//! - `config`: `layerconf.toml` parsing

pub mod api;
pub mod cli;
pub mod config;
