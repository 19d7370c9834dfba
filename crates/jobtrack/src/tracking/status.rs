use serde::Serialize;

use super::domain::ApplicationStatus;

/// Presentation and lifecycle metadata for one application status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApplicationStatusConfig {
    pub status: ApplicationStatus,
    pub label: &'static str,
    pub color_token: &'static str,
    pub icon: &'static str,
    pub is_terminal: bool,
}

const fn entry(
    status: ApplicationStatus,
    label: &'static str,
    color_token: &'static str,
    icon: &'static str,
    is_terminal: bool,
) -> ApplicationStatusConfig {
    ApplicationStatusConfig {
        status,
        label,
        color_token,
        icon,
        is_terminal,
    }
}

// Indexed in `ApplicationStatus::ordered()` order.
static STATUS_TABLE: [ApplicationStatusConfig; 8] = [
    entry(ApplicationStatus::Submitted, "Submitted", "info", "send", false),
    entry(ApplicationStatus::UnderReview, "Under Review", "warning", "eye", false),
    entry(ApplicationStatus::Shortlisted, "Shortlisted", "primary", "star", false),
    entry(
        ApplicationStatus::InterviewScheduled,
        "Interview Scheduled",
        "secondary",
        "calendar",
        false,
    ),
    entry(
        ApplicationStatus::OfferExtended,
        "Offer Extended",
        "accent",
        "gift",
        false,
    ),
    entry(ApplicationStatus::Hired, "Hired", "success", "check-circle", true),
    entry(ApplicationStatus::Rejected, "Rejected", "danger", "x-circle", true),
    entry(ApplicationStatus::Withdrawn, "Withdrawn", "muted", "undo", true),
];

impl ApplicationStatusConfig {
    pub fn for_status(status: ApplicationStatus) -> &'static Self {
        let index = match status {
            ApplicationStatus::Submitted => 0,
            ApplicationStatus::UnderReview => 1,
            ApplicationStatus::Shortlisted => 2,
            ApplicationStatus::InterviewScheduled => 3,
            ApplicationStatus::OfferExtended => 4,
            ApplicationStatus::Hired => 5,
            ApplicationStatus::Rejected => 6,
            ApplicationStatus::Withdrawn => 7,
        };
        &STATUS_TABLE[index]
    }

    pub fn all() -> &'static [ApplicationStatusConfig] {
        &STATUS_TABLE
    }
}
