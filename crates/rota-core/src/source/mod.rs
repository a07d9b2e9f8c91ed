//! Read contracts against the scheduling store.
//!
//! The pipeline only reads. Implementations may be backed by any document
//! store; failures surface as [`rota_common::Error::DataSource`], which callers
//! treat as transient and retry.

pub mod memory;

pub use memory::InMemoryDataSource;

use chrono::NaiveDate;
use rota_common::{CallRecord, LeaveRequest, Resident, ResidentId, Result};
use std::collections::HashSet;

/// Query capability required by forecasting.
pub trait ScheduleDataSource: Send + Sync {
    /// Residents active as of `date`.
    fn active_residents(&self, date: NaiveDate) -> Result<Vec<Resident>>;

    /// Call history for one resident, most recent first, at most `limit` records.
    fn call_history(&self, resident: &ResidentId, limit: usize) -> Result<Vec<CallRecord>>;

    fn holidays(&self) -> Result<HashSet<NaiveDate>>;

    /// All leave requests; callers filter by status and date.
    fn leave_requests(&self) -> Result<Vec<LeaveRequest>>;
}
