//! Core application modules for logsdash.
//!
//! # Module Organization
//!
//! - [`data_plane`] - Log store client seam, AWS implementation, frames and time ranges
//! - [`log_actions`] - Query lifecycle, metadata discovery and batch dispatch
//! - [`api_server`] - Local HTTP endpoint for log action batches
//! - [`config`] - TOML configuration
//!
//! # Architecture
//!
//! - [`data_plane`] talks to CloudWatch Logs and shapes raw output into frames
//! - [`log_actions`] validates requests and drives the start/poll/stop protocol
//! - [`api_server`] exposes [`log_actions::LogActionExecutor`] over HTTP

pub mod api_server;
pub mod config;
pub mod data_plane;
pub mod log_actions;

pub use log_actions::LogActionExecutor;
