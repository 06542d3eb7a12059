//! Session-level services.
//!
//! # Responsibility
//! - Bind one in-memory store to one persistence collaborator.
//! - Keep presentation callers decoupled from storage details.

pub mod workspace_service;
