use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use super::domain::{Application, ApplicationId, ApplicationStatus, CompanyId, JobId, TimelineEvent};
use super::format::{format_calendar, format_relative, timeline_stamp};

/// Card-level representation of an application for list and detail screens.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub company_id: CompanyId,
    pub status: ApplicationStatus,
    pub status_label: &'static str,
    pub color_token: &'static str,
    pub icon: &'static str,
    pub is_terminal: bool,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub applied_relative: String,
    pub updated_relative: String,
    pub timeline_events: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntryView {
    pub status: ApplicationStatus,
    pub label: &'static str,
    pub color_token: &'static str,
    pub icon: &'static str,
    pub occurred_at: DateTime<Utc>,
    pub date: String,
    pub time: String,
    pub calendar: String,
    pub relative: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Application {
    pub fn view(&self, now: DateTime<Utc>) -> ApplicationView {
        let config = self.status.config();
        ApplicationView {
            id: self.id.clone(),
            job_id: self.job_id.clone(),
            company_id: self.company_id.clone(),
            status: self.status,
            status_label: config.label,
            color_token: config.color_token,
            icon: config.icon,
            is_terminal: config.is_terminal,
            applied_at: self.applied_at,
            updated_at: self.updated_at,
            applied_relative: format_relative(self.applied_at, now),
            updated_relative: format_relative(self.updated_at, now),
            timeline_events: self.timeline.len(),
        }
    }
}

impl TimelineEvent {
    pub fn view(&self, now: DateTime<Utc>, offset: FixedOffset) -> TimelineEntryView {
        let config = self.status.config();
        let stamp = timeline_stamp(self.occurred_at, offset);
        TimelineEntryView {
            status: self.status,
            label: config.label,
            color_token: config.color_token,
            icon: config.icon,
            occurred_at: self.occurred_at,
            date: stamp.date,
            time: stamp.time,
            calendar: format_calendar(self.occurred_at, now, offset),
            relative: format_relative(self.occurred_at, now),
            note: self.note.clone(),
        }
    }
}

pub fn timeline_views(
    timeline: &[TimelineEvent],
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Vec<TimelineEntryView> {
    timeline.iter().map(|event| event.view(now, offset)).collect()
}
