//! # Agora Core
//!
//! The domain layer of the Agora discussion board.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod id;
pub mod ports;

pub use error::DomainError;
