//! Data models representing database entities and API payloads.

/// Issued gate credentials
pub mod access_code;
/// Audit trail and the validation contract
pub mod access_log;
/// Event registration payloads
pub mod event;
/// Caller identity
pub mod user;
