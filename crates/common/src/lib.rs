//! Common types, protocol definitions, and errors shared by CryptoSphere crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
