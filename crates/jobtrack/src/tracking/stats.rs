use serde::Serialize;

use super::domain::{Application, ApplicationStatus};

/// Per-status tally, emitted in lifecycle order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: ApplicationStatus,
    pub label: &'static str,
    pub color_token: &'static str,
    pub count: usize,
}

/// Aggregate view over a set of applications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationStats {
    pub total: usize,
    /// Applications in a non-terminal status.
    pub active: usize,
    pub hired: usize,
    /// `hired` over `total`, as a percentage. Zero when there are no applications.
    pub success_rate_percent: f64,
    pub by_status: Vec<StatusCount>,
}

impl ApplicationStats {
    pub fn count(&self, status: ApplicationStatus) -> usize {
        self.by_status
            .iter()
            .find(|entry| entry.status == status)
            .map_or(0, |entry| entry.count)
    }

    pub fn success_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.hired as f64 / self.total as f64
        }
    }
}

pub fn compute_stats(applications: &[Application]) -> ApplicationStats {
    let by_status: Vec<StatusCount> = ApplicationStatus::ordered()
        .into_iter()
        .map(|status| {
            let config = status.config();
            StatusCount {
                status,
                label: config.label,
                color_token: config.color_token,
                count: applications
                    .iter()
                    .filter(|application| application.status == status)
                    .count(),
            }
        })
        .collect();

    let total = applications.len();
    let active = applications
        .iter()
        .filter(|application| !application.is_terminal())
        .count();
    let hired = applications
        .iter()
        .filter(|application| application.status == ApplicationStatus::Hired)
        .count();
    let success_rate_percent = if total == 0 {
        0.0
    } else {
        hired as f64 * 100.0 / total as f64
    };

    ApplicationStats {
        total,
        active,
        hired,
        success_rate_percent,
        by_status,
    }
}
