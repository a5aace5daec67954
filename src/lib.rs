//! Estate visitor access service.
//!
//! Residents issue time-boxed gate codes, security validates them at the
//! gate, and every attempt lands in an append-only audit log.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;
pub mod services;
pub mod state;
pub mod store;
