//! Poll loop, completion detection, deadline, stop and reset of the
//! analysis controller, on a paused tokio clock.

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use shelfsight_core::{AnalysisControllerConfig, AnalysisError, AnalysisJobController};
use shelfsight_domain::constants::{MSG_JOB_NOT_FOUND, MSG_JOB_STOPPED, MSG_JOB_TIMED_OUT};
use shelfsight_domain::{AnalysisStats, JobStatus, LogEventType, ShelfSightError, VideoId};
use support::gateways::{report, start_response, ScriptedAnalysisGateway, StaticRoiDirectory};

const VIDEO: &str = "store1.mp4";

fn video() -> VideoId {
    VideoId::new(VIDEO)
}

fn started() -> ScriptedAnalysisGateway {
    ScriptedAnalysisGateway::new(start_response(json!({
        "status": "success",
        "message": "Behaviour analysis started",
        "video_filename": VIDEO,
        "rois_count": 1,
        "initial_logs": [{"type": "info", "message": "Loading ROIs"}],
        "initial_stats": {"total_customers": 0, "product_interactions": 0},
        "duration_seconds": 120
    })))
}

fn controller(gateway: &Arc<ScriptedAnalysisGateway>) -> AnalysisJobController {
    AnalysisJobController::new(
        gateway.clone(),
        Arc::new(StaticRoiDirectory::default().with(VIDEO, 1)),
        AnalysisControllerConfig::default(),
    )
}

async fn advance(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

fn messages(controller: &AnalysisJobController) -> Vec<String> {
    controller.logs(&video()).into_iter().map(|event| event.message).collect()
}

#[tokio::test(start_paused = true)]
async fn start_seeds_job_from_initial_snapshot() {
    let gateway = Arc::new(started());
    let controller = controller(&gateway);

    let job = controller.start(&video()).await.unwrap();

    assert_eq!(job.status, JobStatus::Analyzing);
    assert!(job.progress_percent.abs() < f64::EPSILON);
    assert_eq!(job.duration_seconds_hint, Some(120));
    assert!(job.started_at_seconds.is_some());
    assert_eq!(messages(&controller), ["Loading ROIs", "Behaviour analysis started"]);
    assert_eq!(gateway.status_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn sentinel_completes_job_and_stops_polling() {
    let gateway = Arc::new(started());
    gateway.push_status(report(json!({
        "status": "analyzing",
        "new_logs": [{"type": "customer_entry", "message": "Cliente entrou"}],
        "updated_stats": {"total_customers": 1},
        "progress": 10
    })));
    gateway.push_status(report(json!({
        "status": "analyzing",
        "new_logs": [{"type": "info", "message": "Total: 3 clientes"}]
    })));
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();

    advance(3_500).await;
    let job = controller.snapshot(&video());
    assert_eq!(job.status, JobStatus::Analyzing);
    assert_eq!(job.stats, AnalysisStats { total_customers: 1, product_interactions: 0 });
    assert!((job.progress_percent - 10.0).abs() < f64::EPSILON);
    let logs = controller.logs(&video());
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[2].kind, LogEventType::CustomerEntry);

    advance(3_000).await;
    let job = controller.snapshot(&video());
    assert_eq!(job.status, JobStatus::Completed);
    assert!((job.progress_percent - 100.0).abs() < f64::EPSILON);
    assert_eq!(messages(&controller).last().map(String::as_str), Some("Total: 3 clientes"));
    assert_eq!(gateway.status_calls(), 2);

    advance(30_000).await;
    assert_eq!(gateway.status_calls(), 2);
    assert!(controller.active_jobs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn sentinel_wins_over_status_field() {
    let gateway = Arc::new(started());
    gateway.push_status(report(json!({
        "status": "rebuilding",
        "new_log": {"type": "info", "message": "Total: 0 clientes"},
        "updated_stats": {"product_interactions": 4}
    })));
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();

    advance(3_500).await;

    let job = controller.snapshot(&video());
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.stats.product_interactions, 4);
    assert!((job.progress_percent - 100.0).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn batch_field_is_preferred_over_single_entry() {
    let gateway = Arc::new(started());
    gateway.push_status(report(json!({
        "status": "analyzing",
        "new_logs": [
            {"type": "customer_entry", "message": "first"},
            {"type": "product_interaction", "message": "second"}
        ],
        "new_log": {"type": "info", "message": "ignored"}
    })));
    gateway.push_status(report(json!({
        "status": "analyzing",
        "new_logs": [],
        "new_log": {"type": "customer_exit", "message": "stale"}
    })));
    gateway.push_status(report(json!({
        "status": "analyzing",
        "new_log": {"type": "customer_exit", "message": "fallback"}
    })));
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();

    advance(9_500).await;

    let tail: Vec<_> = messages(&controller).into_iter().skip(2).collect();
    assert_eq!(tail, ["first", "second", "fallback"]);
}

#[tokio::test(start_paused = true)]
async fn empty_batch_hides_marker_in_single_entry() {
    let gateway = Arc::new(started());
    gateway.push_status(report(json!({
        "status": "analyzing",
        "new_logs": [],
        "new_log": {"type": "info", "message": "Total: 3 clientes"}
    })));
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();

    advance(3_500).await;

    assert_eq!(controller.snapshot(&video()).status, JobStatus::Analyzing);
    assert!(!messages(&controller).iter().any(|m| m.contains("Total:")));
}

#[tokio::test(start_paused = true)]
async fn zero_progress_keeps_last_reported_value() {
    let gateway = Arc::new(started());
    gateway.push_status(report(json!({"status": "analyzing", "progress": 45.0})));
    gateway.push_status(report(json!({"status": "analyzing", "progress": 0})));
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();

    advance(6_500).await;

    assert!((controller.snapshot(&video()).progress_percent - 45.0).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn subscribers_wake_on_each_applied_report() {
    let gateway = Arc::new(started());
    gateway.push_status(report(json!({"status": "analyzing", "progress": 20})));
    gateway.push_status(report(json!({
        "status": "analyzing",
        "new_logs": [{"type": "info", "message": "Total: 2 clientes"}]
    })));
    let controller = controller(&gateway);
    let mut updates = controller.subscribe();
    controller.start(&video()).await.unwrap();
    assert!(updates.has_changed().unwrap());
    let _ = updates.borrow_and_update();

    let mut wakeups = 0;
    while controller.snapshot(&video()).status.is_active() {
        updates.changed().await.unwrap();
        wakeups += 1;
    }

    assert_eq!(wakeups, 2);
    assert_eq!(gateway.status_calls(), 2);
    let (fresh, total) = controller.logs_since(&video(), 2);
    assert_eq!(total, 3);
    assert_eq!(fresh.len(), 1);
    assert!(controller.logs_since(&video(), 10).0.is_empty());
}

#[tokio::test(start_paused = true)]
async fn partial_stats_keep_prior_values() {
    let gateway = Arc::new(started());
    gateway.push_status(report(json!({
        "status": "analyzing",
        "updated_stats": {"total_customers": 2, "product_interactions": 5},
        "progress": 30
    })));
    gateway.push_status(report(json!({"status": "analyzing", "updated_stats": {"total_customers": 3}})));
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();

    advance(6_500).await;

    let job = controller.snapshot(&video());
    assert_eq!(job.stats, AnalysisStats { total_customers: 3, product_interactions: 5 });
    assert!((job.progress_percent - 30.0).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn completed_status_resyncs_full_history() {
    let gateway = Arc::new(started());
    gateway.push_status(report(json!({
        "status": "analyzing",
        "new_logs": [{"type": "customer_entry", "message": "partial"}]
    })));
    gateway.push_status(report(json!({
        "status": "completed",
        "message": "done",
        "all_logs": [
            {"type": "customer_entry", "message": "A"},
            {"type": "customer_exit", "message": "B"}
        ],
        "completion_log": {"type": "info", "message": "Analysis finished"},
        "final_stats": {"total_customers": 5, "product_interactions": 7},
        "progress": 100
    })));
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();

    advance(6_500).await;

    let job = controller.snapshot(&video());
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.stats, AnalysisStats { total_customers: 5, product_interactions: 7 });
    assert_eq!(messages(&controller), ["A", "B", "Analysis finished"]);

    advance(10_000).await;
    assert_eq!(gateway.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn not_found_is_terminal() {
    let gateway = Arc::new(started());
    gateway.push_status(report(json!({"status": "not_found", "message": "no session"})));
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();

    advance(3_500).await;

    assert_eq!(controller.snapshot(&video()).status, JobStatus::NotFound);
    assert_eq!(messages(&controller).last().map(String::as_str), Some(MSG_JOB_NOT_FOUND));
    advance(10_000).await;
    assert_eq!(gateway.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn poll_errors_are_retried_silently() {
    let gateway = Arc::new(started());
    gateway.push_status_error(ShelfSightError::Network("connection reset".into()));
    gateway.push_status(report(json!({"status": "analyzing", "progress": 20})));
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();

    advance(3_500).await;
    assert_eq!(controller.snapshot(&video()).status, JobStatus::Analyzing);
    assert_eq!(controller.logs(&video()).len(), 2);

    advance(3_000).await;
    let job = controller.snapshot(&video());
    assert_eq!(job.status, JobStatus::Analyzing);
    assert!((job.progress_percent - 20.0).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn deadline_times_out_with_a_single_log() {
    let gateway = Arc::new(started());
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();

    advance(601_000).await;

    assert_eq!(controller.snapshot(&video()).status, JobStatus::TimedOut);
    let timeouts = messages(&controller).iter().filter(|m| m.as_str() == MSG_JOB_TIMED_OUT).count();
    assert_eq!(timeouts, 1);
    assert_eq!(controller.logs(&video()).len(), 3);

    let calls = gateway.status_calls();
    advance(60_000).await;
    assert_eq!(gateway.status_calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn deadline_preempts_a_hanging_request() {
    let gateway = Arc::new(started());
    gateway.delay_statuses(Duration::from_secs(3_600));
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();

    advance(600_500).await;

    assert_eq!(controller.snapshot(&video()).status, JobStatus::TimedOut);
    assert_eq!(gateway.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn second_start_is_rejected_without_side_effects() {
    let gateway = Arc::new(started());
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();
    let before = (controller.snapshot(&video()), controller.logs(&video()));

    let err = controller.start(&video()).await.unwrap_err();

    assert_eq!(err, AnalysisError::JobAlreadyActive);
    assert_eq!((controller.snapshot(&video()), controller.logs(&video())), before);
    assert_eq!(gateway.start_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn start_requires_saved_rois() {
    let gateway = Arc::new(started());
    let controller = AnalysisJobController::new(
        gateway.clone(),
        Arc::new(StaticRoiDirectory::default()),
        AnalysisControllerConfig::default(),
    );

    let err = controller.start(&video()).await.unwrap_err();

    assert_eq!(err, AnalysisError::NoRoisForVideo);
    assert_eq!(gateway.start_calls(), 0);
    assert_eq!(controller.snapshot(&video()).status, JobStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_reverts_to_idle() {
    let gateway = Arc::new(ScriptedAnalysisGateway::failing_start(ShelfSightError::Network("timeout".into())));
    let controller = controller(&gateway);

    let err = controller.start(&video()).await.unwrap_err();

    assert!(matches!(err, AnalysisError::StartFailed { .. }));
    assert_eq!(controller.snapshot(&video()).status, JobStatus::Idle);
    advance(10_000).await;
    assert_eq!(gateway.status_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn refused_start_surfaces_backend_message() {
    let gateway = Arc::new(ScriptedAnalysisGateway::new(start_response(json!({
        "status": "error",
        "message": "Analysis already running for this video"
    }))));
    let controller = controller(&gateway);

    let err = controller.start(&video()).await.unwrap_err();

    assert_eq!(err, AnalysisError::StartFailed { reason: "Analysis already running for this video".into() });
    assert_eq!(controller.snapshot(&video()).status, JobStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn stop_halts_polling_and_logs() {
    let gateway = Arc::new(started());
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();
    advance(3_500).await;

    let job = controller.stop(&video()).await.unwrap();

    assert_eq!(job.status, JobStatus::Stopped);
    assert_eq!(messages(&controller).last().map(String::as_str), Some(MSG_JOB_STOPPED));
    let calls = gateway.status_calls();
    advance(30_000).await;
    assert_eq!(gateway.status_calls(), calls);
    assert_eq!(gateway.reset_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn response_in_flight_at_stop_is_discarded() {
    let gateway = Arc::new(started());
    gateway.delay_statuses(Duration::from_secs(10));
    gateway.push_status(report(json!({
        "status": "analyzing",
        "new_log": {"type": "customer_entry", "message": "late"},
        "progress": 50
    })));
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();

    advance(5_000).await;
    controller.stop(&video()).await.unwrap();
    advance(20_000).await;

    let job = controller.snapshot(&video());
    assert_eq!(job.status, JobStatus::Stopped);
    assert!(job.progress_percent.abs() < f64::EPSILON);
    assert!(!messages(&controller).contains(&"late".to_string()));
}

#[tokio::test(start_paused = true)]
async fn stop_requires_analyzing() {
    let gateway = Arc::new(started());
    let controller = controller(&gateway);

    let err = controller.stop(&video()).await.unwrap_err();

    assert_eq!(err, AnalysisError::NotAnalyzing { status: JobStatus::Idle });
}

#[tokio::test(start_paused = true)]
async fn reset_from_terminal_state_clears_everything() {
    let gateway = Arc::new(started());
    gateway.push_status(report(json!({
        "status": "analyzing",
        "new_logs": [{"type": "info", "message": "Total: 9 clientes"}],
        "updated_stats": {"total_customers": 9, "product_interactions": 2}
    })));
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();
    advance(3_500).await;
    assert_eq!(controller.snapshot(&video()).status, JobStatus::Completed);

    let job = controller.reset(&video()).await;

    assert_eq!(job.status, JobStatus::Idle);
    assert!(job.progress_percent.abs() < f64::EPSILON);
    assert_eq!(job.stats, AnalysisStats::default());
    assert!(controller.logs(&video()).is_empty());
    assert_eq!(gateway.reset_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn terminal_job_needs_reset_before_restart() {
    let gateway = Arc::new(started());
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();
    controller.stop(&video()).await.unwrap();

    let err = controller.start(&video()).await.unwrap_err();
    assert_eq!(err, AnalysisError::ResetRequired { status: JobStatus::Stopped });

    gateway.fail_reset(ShelfSightError::Network("backend down".into()));
    let job = controller.reset(&video()).await;
    assert_eq!(job.status, JobStatus::Idle);

    let job = controller.start(&video()).await.unwrap();
    assert_eq!(job.status, JobStatus::Analyzing);
    assert_eq!(gateway.start_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn reset_cancels_an_active_job() {
    let gateway = Arc::new(started());
    let controller = controller(&gateway);
    controller.start(&video()).await.unwrap();
    advance(3_500).await;

    controller.reset(&video()).await;
    let calls = gateway.status_calls();
    advance(30_000).await;

    assert_eq!(controller.snapshot(&video()).status, JobStatus::Idle);
    assert_eq!(gateway.status_calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn jobs_for_different_videos_are_independent() {
    let gateway = Arc::new(started());
    let controller = AnalysisJobController::new(
        gateway.clone(),
        Arc::new(StaticRoiDirectory::default().with("a.mp4", 1).with("b.mp4", 2)),
        AnalysisControllerConfig::default(),
    );

    controller.start(&VideoId::new("a.mp4")).await.unwrap();
    controller.start(&VideoId::new("b.mp4")).await.unwrap();
    controller.stop(&VideoId::new("a.mp4")).await.unwrap();

    assert_eq!(controller.snapshot(&VideoId::new("a.mp4")).status, JobStatus::Stopped);
    assert_eq!(controller.snapshot(&VideoId::new("b.mp4")).status, JobStatus::Analyzing);
    assert_eq!(controller.active_jobs(), vec![VideoId::new("b.mp4")]);
}
