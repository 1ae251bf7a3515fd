//! Cross-component scenarios against the in-memory deployment.

pub mod consistency;
pub mod flows;
