//! # Slotwatch Domain
//!
//! Business domain types and models for slotwatch.
//!
//! This crate contains:
//! - Scheduling data types (Calendar, TimeSlot, Member, ScheduleEntry)
//! - Availability and notification types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other slotwatch crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
