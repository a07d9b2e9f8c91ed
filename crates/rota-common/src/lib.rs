//! Rota common types, IDs, and errors.
//!
//! This crate provides foundational types shared across rota crates:
//! - Resident identity newtypes
//! - Records read from the scheduling store (residents, call history, leave)
//! - Schedule entries scored by the anomaly pipeline
//! - The unified error type
//! - Output format specifications

pub mod error;
pub mod id;
pub mod output;
pub mod records;

pub use error::{Error, ErrorCategory, Result, StructuredError, SuggestedAction};
pub use id::ResidentId;
pub use output::OutputFormat;
pub use records::{CallRecord, DateRange, LeaveRequest, LeaveStatus, Resident, ScheduleEntry};
