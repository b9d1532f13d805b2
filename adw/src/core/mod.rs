//! Deterministic, pure logic shared by every workflow.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data (branch names, captured output, log sections) and return
//! deterministic outputs suitable for tests.

pub mod branch;
pub mod errors;
pub mod extract;
pub mod run_log;
pub mod types;
