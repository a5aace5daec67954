//! Business logic services.
//!
//! Services contain the access-code lifecycle, separated from HTTP handlers.
//! They reach storage only through [`crate::store::AccessStore`].

pub mod code_generator;
pub mod inventory;
pub mod validation;
pub mod window;
