use crate::infra::{read_cv_file, InMemoryApplicationTransport, LogNotifications};
use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Args;
use jobtrack::clock::{Clock, FixedClock};
use jobtrack::config::DisplayConfig;
use jobtrack::error::AppError;
use jobtrack::profile::{completeness_report, CompletenessReport, CvData};
use jobtrack::session::{LocalSession, UserId};
use jobtrack::tracking::{
    timeline_views, Application, ApplicationFilter, ApplicationStatus, ApplicationTracker,
    FeedEvent, JobId, TimelineEvent, TimelineRecord, TrackerError,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// CV JSON document (camelCase fields, e.g. personalInfo.fullName)
    pub(crate) path: PathBuf,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let cv = read_cv_file(&args.path)?;
    if cv.is_none() {
        println!("{} is not a CV document", args.path.display());
    }
    render_report(&completeness_report(cv.as_ref()));
    Ok(())
}

fn render_report(report: &CompletenessReport) {
    println!(
        "CV completeness: {}/100 ({})",
        report.score, report.status.label
    );
    println!("Sections:");
    for component in &report.components {
        let mark = if component.satisfied { "x" } else { " " };
        println!(
            "  [{mark}] {}: {}/{}",
            component.label, component.points, component.max_points
        );
    }
    if !report.hints.is_empty() {
        println!("Next steps:");
        for hint in &report.hints {
            println!("  - {hint}");
        }
    }
}

fn demo_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 5, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub(crate) async fn run_demo() -> Result<(), AppError> {
    let start = demo_start();
    let clock = Arc::new(FixedClock::new(start));
    let transport = Arc::new(InMemoryApplicationTransport::new(clock.clone()));
    let session = Arc::new(LocalSession::signed_in(UserId("demo-seeker".to_string())));
    let tracker = ApplicationTracker::new(transport.clone(), session, Arc::new(LogNotifications))
        .with_clock(clock.clone());
    let display = DisplayConfig::default();

    println!("Job application tracking demo");
    tracker.start_session().await?;

    let mut submitted = Vec::new();
    for job in ["backend-engineer", "data-analyst", "product-designer"] {
        let application = tracker.apply(&JobId(job.to_string())).await?;
        println!("- Applied to {job} -> {}", application.id);
        submitted.push(application);
        clock.advance(Duration::minutes(20));
    }
    let [backend, data, design] = [&submitted[0], &submitted[1], &submitted[2]];

    match tracker.apply(&backend.job_id).await {
        Err(err) => println!("- Second application to {} refused: {err}", backend.job_id),
        Ok(application) => println!("- Unexpected duplicate application {}", application.id),
    }

    println!("\nEmployer updates for {}", backend.job_id);
    let employer_updates = [
        (ApplicationStatus::UnderReview, 1, None),
        (
            ApplicationStatus::InterviewScheduled,
            3,
            Some("Panel interview with the platform team"),
        ),
        (ApplicationStatus::OfferExtended, 7, None),
        (ApplicationStatus::Hired, 9, Some("Start date confirmed")),
    ];
    for (status, days, note) in employer_updates {
        let mut event = TimelineEvent::new(status, start + Duration::days(days));
        if let Some(note) = note {
            event = event.with_note(note);
        }
        transport
            .push_event(&backend.id, &event)
            .map_err(TrackerError::from)?;
    }
    let timeline = tracker.sync_timeline(&backend.id).await?;
    println!("- Synced {} timeline events", timeline.len());

    println!("\nStatus feed for {}", data.job_id);
    let feed_event = |status: &str, at: DateTime<Utc>| FeedEvent {
        application_id: data.id.0.clone(),
        event: TimelineRecord {
            status: status.to_string(),
            occurred_at: at,
            note: None,
        },
    };
    let summary = tracker.ingest_feed(vec![
        feed_event("under_review", start + Duration::days(2)),
        feed_event("shortlisted", start + Duration::days(4)),
        feed_event("rejected", start + Duration::days(3)),
        feed_event("ghosted", start + Duration::days(5)),
    ]);
    println!(
        "- {} applied | {} out of order | {} rejected",
        summary.applied, summary.out_of_order, summary.rejected
    );

    clock.set(start + Duration::days(5));
    let withdrawn = tracker.withdraw(&design.id).await?;
    println!(
        "\nWithdrew {} at {}",
        withdrawn.job_id,
        withdrawn.updated_at.format("%d %b %Y %H:%M")
    );
    match tracker.withdraw(&backend.id).await {
        Err(err) => println!("- Withdrawing {} refused: {err}", backend.job_id),
        Ok(_) => println!("- Unexpected withdrawal of {}", backend.job_id),
    }

    clock.set(start + Duration::days(10));
    let now = clock.now();
    println!("\nApplications (most recently updated first)");
    for application in tracker.applications(&ApplicationFilter::default()) {
        render_application(&application, now, display);
    }

    let stats = tracker.stats();
    println!("\nStatistics");
    println!(
        "- {} total | {} active | {} hired | {:.0}% success rate",
        stats.total, stats.active, stats.hired, stats.success_rate_percent
    );
    for entry in stats.by_status.iter().filter(|entry| entry.count > 0) {
        println!("  - {}: {}", entry.label, entry.count);
    }

    println!("\nCV completeness for the demo profile");
    render_report(&completeness_report(Some(&demo_cv())));

    Ok(())
}

fn render_application(application: &Application, now: DateTime<Utc>, display: DisplayConfig) {
    let view = application.view(now);
    println!(
        "- {} ({}) -> {} [{}], updated {}",
        view.job_id, view.id, view.status_label, view.color_token, view.updated_relative
    );
    for entry in timeline_views(&application.timeline, now, display.utc_offset) {
        match entry.note {
            Some(note) => println!("    {} {} | {} ({note})", entry.date, entry.time, entry.label),
            None => println!("    {} {} | {}", entry.date, entry.time, entry.label),
        }
    }
}

fn demo_cv() -> CvData {
    let mut cv = CvData::default();
    cv.personal_info.full_name = Some("Demo Seeker".to_string());
    cv.personal_info.email = Some("seeker@example.com".to_string());
    cv.personal_info.city = Some("Jakarta".to_string());
    cv.personal_info.summary = Some("Backend engineer who enjoys data tooling".to_string());
    cv.experience.push(json!({
        "company": "Nusantara Logistics",
        "position": "Backend engineer"
    }));
    cv.skills = vec![json!("Rust"), json!("PostgreSQL")];
    cv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_runs_to_completion() {
        run_demo().await.expect("demo completes");
    }

    #[test]
    fn demo_cv_is_partially_complete() {
        let report = completeness_report(Some(&demo_cv()));
        assert_eq!(report.score, 50);
        assert_eq!(report.status.label, "Needs Completion");
    }
}
