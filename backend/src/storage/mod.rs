//! # Storage Module
//!
//! Persistence boundary of the donation tracker. The domain layer only sees
//! the traits in [`traits`]; [`sqlite`] is the shipped implementation.

pub mod sqlite;
pub mod traits;

pub use sqlite::DbConnection;
pub use traits::*;
