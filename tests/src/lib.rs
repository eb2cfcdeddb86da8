//! # KeyMesh Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Tracker and router throughput (criterion)
//! └── src/integration/  # Boards exchanging over a shared broker
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p km-tests
//! cargo test -p km-tests integration::two_boards
//! cargo bench -p km-tests
//! ```

pub mod integration;
