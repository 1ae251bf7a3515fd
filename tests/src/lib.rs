//! # Secret Reactions Test Suite
//!
//! Unified test crate.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── consistency.rs  # Refresh idempotence, staleness, single-flight, reset
//!     └── flows.rs        # Multi-user react / access / decrypt scenarios
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sr-tests
//! cargo test -p sr-tests integration::flows::
//! cargo bench -p sr-tests
//! ```

pub mod integration;
