//! Shared types for the puglands economy: the data model, signed
//! transactions, storage keys/values, API payloads, and the error taxonomy.

pub mod api;
pub mod economy;
mod error;
pub mod execution;

pub use error::EconomyError;
pub use execution::{Instruction, Transaction, NAMESPACE};
