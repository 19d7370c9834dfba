//! CV completeness scoring over read-only profile snapshots.

pub mod completeness;
pub mod cv;
pub mod router;
pub mod source;

pub use completeness::{
    completeness_report, completeness_status, cv_from_value, score, score_value, CompletenessLevel,
    CompletenessReport, CompletenessStatus, CvSection, SectionScore,
};
pub use cv::{CvData, PersonalInfo};
pub use router::{profile_router, ProfileRouterState};
pub use source::{assess_profile, ProfileError, ProfileSource};
