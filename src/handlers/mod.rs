//! HTTP request handlers (route handlers).
//!
//! Handlers check the caller's role, build a service over
//! [`crate::state::AppState::store`] and translate the result to JSON.

/// Code generation, listing and gate validation
pub mod codes;
/// Public event pages and guest registration
pub mod events;
pub mod health;
pub mod logs;
