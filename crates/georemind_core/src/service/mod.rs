//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and reconciler calls into use-case level APIs.
//! - Keep UI layers decoupled from storage and provider details.

pub mod reminder_service;
