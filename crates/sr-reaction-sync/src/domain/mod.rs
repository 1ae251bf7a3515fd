//! # Domain Module
//!
//! Core domain types for reaction synchronization.

pub mod catalogue;
pub mod entities;
pub mod errors;
pub mod invariants;
pub mod value_objects;

pub use catalogue::{Post, Reaction, POSTS, REACTIONS};
pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use value_objects::*;
