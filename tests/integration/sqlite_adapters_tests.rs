use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use rusqlite::{named_params, Connection};
use tempfile::TempDir;
use teamsync_core::db::repositories::calendar_repository::CalendarRepository;
use teamsync_core::db::DbPool;
use teamsync_core::models::availability::{BusyKind, SearchWindow};
use teamsync_core::models::scheduling::{MeetingRequest, MeetingType};
use teamsync_core::models::settings::EngineSettings;
use teamsync_core::models::workload::WorkloadPeriod;
use teamsync_core::services::availability_analyzer::AvailabilityAnalyzer;
use teamsync_core::services::cache_service::SqliteResultCache;
use teamsync_core::services::calendar_source::CalendarSource;
use teamsync_core::services::result_cache::{CacheKey, ResultCache};
use teamsync_core::services::smart_scheduler::SmartScheduler;
use teamsync_core::services::sqlite_source::SqliteCalendarSource;
use teamsync_core::AppResult;

fn monday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).single().unwrap()
}

fn stamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn setup() -> (TempDir, DbPool) {
    let dir = tempfile::tempdir().unwrap();
    let pool = DbPool::new(dir.path().join("teamsync.sqlite")).unwrap();
    (dir, pool)
}

// The calendar tables are owned by the host application; tests write rows directly.
fn seed_event(
    conn: &Connection,
    id: &str,
    user: &str,
    start: DateTime<Utc>,
    minutes: i64,
    event_type: &str,
    status: &str,
) -> AppResult<()> {
    conn.execute(
        "INSERT INTO calendar_events (id, user_id, title, start_at, end_at, event_type, status, created_at)
         VALUES (:id, :user_id, 'planning', :start_at, :end_at, :event_type, :status, :created_at)",
        named_params! {
            ":id": id,
            ":user_id": user,
            ":start_at": stamp(start),
            ":end_at": stamp(start + Duration::minutes(minutes)),
            ":event_type": event_type,
            ":status": status,
            ":created_at": stamp(monday()),
        },
    )?;
    Ok(())
}

fn seed_task(
    conn: &Connection,
    id: &str,
    user: &str,
    due: Option<DateTime<Utc>>,
    status: &str,
) -> AppResult<()> {
    conn.execute(
        "INSERT INTO tasks (id, assigned_to, title, due_at, status, created_at)
         VALUES (:id, :assigned_to, 'quarterly report', :due_at, :status, :created_at)",
        named_params! {
            ":id": id,
            ":assigned_to": user,
            ":due_at": due.map(stamp),
            ":status": status,
            ":created_at": stamp(monday()),
        },
    )?;
    Ok(())
}

#[test]
fn pool_creates_schema_once_and_reopens_existing_file() {
    let (_dir, pool) = setup();
    pool.with_connection(|conn| seed_event(conn, "e1", "alice", monday(), 30, "meeting", "confirmed"))
        .unwrap();

    // Reopening the same file keeps existing rows.
    let reopened = DbPool::new(pool.path()).unwrap();
    let window = SearchWindow::days_from(monday(), 1).unwrap();
    let events = reopened
        .with_connection(|conn| CalendarRepository::events_in_window(conn, "alice", &window))
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "e1");
}

#[tokio::test]
async fn sqlite_source_maps_events_and_tasks() {
    let (_dir, pool) = setup();
    pool.with_connection(|conn| {
        seed_event(conn, "e1", "alice", monday() + Duration::hours(9), 60, "meeting", "confirmed")?;
        seed_event(conn, "e2", "alice", monday() + Duration::hours(13), 60, "meeting", "cancelled")?;
        seed_event(conn, "e3", "alice", monday() + Duration::hours(15), 30, "deadline", "tentative")?;
        seed_task(
            conn,
            "t1",
            "alice",
            Some(monday() + Duration::days(1) + Duration::hours(12)),
            "in_progress",
        )?;
        seed_task(conn, "t2", "alice", None, "pending")?;
        Ok(())
    })
    .unwrap();

    let source = SqliteCalendarSource::new(pool);
    let window = SearchWindow::days_from(monday(), 7).unwrap();

    let busy = source.get_busy_intervals("alice", &window).await.unwrap();
    assert_eq!(busy.len(), 2);
    assert_eq!(busy[0].kind, BusyKind::Meeting);
    assert_eq!(busy[1].kind, BusyKind::Deadline);

    let tasks = source.get_tasks_with_deadlines("alice", &window).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert!(source.get_busy_intervals("nobody", &window).await.unwrap().is_empty());
}

#[tokio::test]
async fn end_to_end_with_sqlite_source_and_cache() {
    let (_dir, pool) = setup();
    pool.with_connection(|conn| {
        // Alice is in meetings all Monday morning; Bob has a deadline at Monday 13:00.
        seed_event(conn, "e1", "alice", monday() + Duration::hours(9), 180, "meeting", "confirmed")?;
        seed_task(conn, "t1", "bob", Some(monday() + Duration::hours(13)), "pending")?;
        Ok(())
    })
    .unwrap();

    let source = Arc::new(SqliteCalendarSource::new(pool.clone()));
    let cache: Arc<dyn ResultCache> = Arc::new(SqliteResultCache::new(pool.clone()));
    let scheduler =
        SmartScheduler::new(EngineSettings::default(), source, Some(Arc::clone(&cache))).unwrap();

    let participants = vec!["alice".to_string(), "bob".to_string()];
    let window = SearchWindow::new(monday(), monday() + Duration::days(1)).unwrap();
    let request = MeetingRequest::new(participants.clone(), 60)
        .meeting_type(MeetingType::DecisionMaking)
        .search_window(window);

    let result = scheduler.find_optimal_meeting_time(&request).await.unwrap();

    // 09:00-12:00 is taken by Alice and 11:00-13:00 by Bob's deadline block.
    assert_eq!(result.recommended_time, monday() + Duration::hours(13));
    assert!(result
        .alternative_times
        .iter()
        .all(|start| *start >= monday() + Duration::hours(13)));

    let cached = scheduler.recent_result(&participants).await.unwrap();
    assert_eq!(cached.result, result);

    let raw = cache
        .get(&CacheKey::scheduling_result(&participants).cache_key())
        .await
        .unwrap();
    assert!(raw.is_some());

    let report = scheduler
        .analyze_team_workload_at(&participants, WorkloadPeriod::Week, monday() + Duration::days(7))
        .await
        .unwrap();
    assert_eq!(report.user("alice").unwrap().total_meeting_minutes, 180);
    assert_eq!(report.user("bob").unwrap().task_count, 1);
}

#[tokio::test]
async fn learned_productivity_profile_comes_from_sqlite_cache() {
    let (_dir, pool) = setup();
    let cache = Arc::new(SqliteResultCache::new(pool.clone()));
    cache
        .set(
            &CacheKey::productivity_patterns("alice").cache_key(),
            br#"{"early_morning": 0.1, "late_afternoon": 1.0}"#.to_vec(),
            StdDuration::from_secs(600),
        )
        .await
        .unwrap();

    let analyzer = AvailabilityAnalyzer::new(
        Arc::new(SqliteCalendarSource::new(pool)),
        Some(cache),
        &EngineSettings::default(),
    );
    let window = SearchWindow::days_from(monday(), 7).unwrap();
    let profile = analyzer.profile_for("alice", &window).await;

    assert_eq!(profile.productivity().early_morning, 0.1);
    assert_eq!(profile.productivity().late_afternoon, 1.0);
    assert_eq!(profile.productivity().evening, 0.5);
}

#[tokio::test]
async fn expired_results_are_purged() {
    let (_dir, pool) = setup();
    let cache = SqliteResultCache::new(pool);

    cache.set("scheduling_result:a", vec![1], StdDuration::ZERO).await.unwrap();
    cache
        .set("scheduling_result:b", vec![2], StdDuration::from_secs(600))
        .await
        .unwrap();

    assert_eq!(cache.purge_expired().await.unwrap(), 1);
    assert_eq!(cache.get("scheduling_result:b").await.unwrap(), Some(vec![2]));
}
