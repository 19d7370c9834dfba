//! Application lifecycle tracking: status state machine, timelines, statistics,
//! and the collaborator contracts the tracker is wired against.

pub mod domain;
pub mod format;
pub mod notify;
pub mod router;
pub mod stats;
pub mod status;
pub mod tracker;
pub mod transport;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationStatus, CompanyId, JobId,
    StatusParseError, TimelineEvent,
};
pub use format::{format_calendar, format_relative, timeline_stamp, TimelineStamp};
pub use notify::{NotificationError, NotificationKind, NotificationSink};
pub use router::{application_router, TrackerRouterState};
pub use stats::{compute_stats, ApplicationStats, StatusCount};
pub use status::ApplicationStatusConfig;
pub use tracker::{ApplicationTracker, FeedSummary, TrackerError, TrackerUpdate};
pub use transport::{
    ApplicationRecord, ApplicationTransport, FeedEvent, TimelineRecord, TransportError,
};
pub use views::{timeline_views, ApplicationView, TimelineEntryView};
