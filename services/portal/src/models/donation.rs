//! Donation record model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single recorded donation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationRecord {
    pub id: u64,
    /// Day the donation was weighed, `YYYY-MM-DD` on the wire
    pub date: NaiveDate,
    /// Weight in kilograms
    pub quantity: f64,
}
