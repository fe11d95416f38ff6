//! Donation dashboard and history

use chrono::NaiveDate;
use common::store::KeyValueStore;
use tracing::info;

use crate::error::{PortalError, PortalResult};
use crate::gateway::ProfileGateway;
use crate::models::DonationRecord;
use crate::session::SessionStore;
use crate::validation::format_user_id;

/// Records shown on the dashboard panel
const RECENT_DONATIONS: usize = 3;

/// Short day label, e.g. `17 Nov`
pub fn date_label(date: NaiveDate) -> String {
    date.format("%d %b").to_string()
}

/// First word of the display name, or "Donor"
pub fn greeting_name(display_name: &str) -> &str {
    display_name.split_whitespace().next().unwrap_or("Donor")
}

/// Donation history ordered newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonationSummary {
    records: Vec<DonationRecord>,
}

impl DonationSummary {
    pub fn new(mut records: Vec<DonationRecord>) -> Self {
        records.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Self { records }
    }

    pub fn records(&self) -> &[DonationRecord] {
        &self.records
    }

    pub fn total_kg(&self) -> f64 {
        self.records.iter().map(|r| r.quantity).sum()
    }

    pub fn recent(&self) -> &[DonationRecord] {
        &self.records[..self.records.len().min(RECENT_DONATIONS)]
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Everything the dashboard renders
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub greeting: String,
    /// Issued code, zero padded
    pub user_code: Option<String>,
    pub summary: DonationSummary,
}

impl Dashboard {
    /// Load the signed-in donor's dashboard
    pub async fn load<G, S>(sessions: &SessionStore<G, S>) -> PortalResult<Self>
    where
        G: ProfileGateway,
        S: KeyValueStore,
    {
        let session = sessions
            .current_session()
            .ok_or(PortalError::NotAuthenticated)?;
        let token = sessions.auth_token().await?;
        let records = sessions.gateway().donation_history(&token).await?;
        info!(
            "Loaded {} donations for user {}",
            records.len(),
            session.user_id
        );

        Ok(Self {
            greeting: greeting_name(&session.display_name).to_string(),
            user_code: session.user_code.as_deref().map(format_user_id),
            summary: DonationSummary::new(records),
        })
    }
}
