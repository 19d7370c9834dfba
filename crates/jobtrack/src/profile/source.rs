use async_trait::async_trait;
use tracing::warn;

use super::completeness::{completeness_report, CompletenessReport};
use super::cv::CvData;
use crate::session::UserId;

/// Read-only access to CV snapshots owned by the profile editing flows.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// `Ok(None)` when the user has not started a CV yet.
    async fn fetch_cv(&self, user: &UserId) -> Result<Option<CvData>, ProfileError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("profile service unavailable: {0}")]
    Unavailable(String),
    #[error("malformed cv payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Scores the user's current CV. Source failures degrade to an empty report.
pub async fn assess_profile<S>(source: &S, user: &UserId) -> CompletenessReport
where
    S: ProfileSource + ?Sized,
{
    match source.fetch_cv(user).await {
        Ok(cv) => completeness_report(cv.as_ref()),
        Err(err) => {
            warn!(%user, error = %err, "profile unavailable, reporting zero completeness");
            completeness_report(None)
        }
    }
}
