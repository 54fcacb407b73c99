//! services/api/src/lib.rs
//!
//! The HTTP service around `summarizer_core`: adapters for the outside world,
//! configuration, and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
