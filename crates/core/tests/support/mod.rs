//! Shared test helpers for `slotwatch-core` integration tests.
//!
//! In-memory mocks for the record store, transport and clock so that service
//! tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod fixtures;
pub mod store;
pub mod transport;
