use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc, Weekday};
use teamsync_core::models::availability::{BusyInterval, BusyKind, SearchWindow};
use teamsync_core::models::scheduling::{
    ConflictWarning, MeetingRequest, MeetingType, ProductivityImpact, ReasonCode,
};
use teamsync_core::models::settings::EngineSettings;
use teamsync_core::services::availability_analyzer::AvailabilityAnalyzer;
use teamsync_core::services::calendar_source::InMemoryCalendarSource;
use teamsync_core::services::result_cache::{MemoryResultCache, ResultCache};
use teamsync_core::services::scoring_engine::ScoringEngine;
use teamsync_core::services::slot_generator::SlotGenerator;
use teamsync_core::services::smart_scheduler::SmartScheduler;
use teamsync_core::models::scheduling::SchedulingConstraint;

// 2026-03-02 is a Monday.
fn monday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).single().unwrap()
}

fn two_weeks() -> SearchWindow {
    SearchWindow::days_from(monday(), 14).unwrap()
}

fn participants() -> Vec<String> {
    vec!["alice".to_string(), "bob".to_string()]
}

fn engine(source: InMemoryCalendarSource) -> SmartScheduler {
    SmartScheduler::new(EngineSettings::default(), Arc::new(source), None).unwrap()
}

#[tokio::test]
async fn free_team_gets_monday_nine_am() {
    let scheduler = engine(InMemoryCalendarSource::new());
    let request = MeetingRequest::new(participants(), 30).search_window(two_weeks());

    let result = scheduler.find_optimal_meeting_time(&request).await.unwrap();

    assert_eq!(result.recommended_time, monday() + Duration::hours(9));
    assert!(result.confidence_score > 0.3);
    assert_eq!(result.reason, ReasonCode::MorningProductivity);
    assert_eq!(result.productivity_impact, ProductivityImpact::ModeratePositive);
    assert_eq!(result.alternative_times.len(), 5);
    assert!(!result.alternative_times.contains(&result.recommended_time));
}

#[tokio::test]
async fn busy_first_days_are_never_proposed() {
    let source = InMemoryCalendarSource::new();
    source
        .add_busy(
            "bob",
            BusyInterval::new(monday(), monday() + Duration::days(3), BusyKind::Meeting),
        )
        .unwrap();
    let scheduler = engine(source);
    let request = MeetingRequest::new(participants(), 30).search_window(two_weeks());

    let result = scheduler.find_optimal_meeting_time(&request).await.unwrap();

    let blocked_until = monday() + Duration::days(3);
    assert!(result.recommended_time >= blocked_until);
    assert!(result
        .alternative_times
        .iter()
        .all(|start| *start >= blocked_until));
}

#[tokio::test]
async fn no_candidate_for_overlong_meeting() {
    let scheduler = engine(InMemoryCalendarSource::new());
    let request = MeetingRequest::new(participants(), 600).search_window(two_weeks());

    let result = scheduler.find_optimal_meeting_time(&request).await.unwrap();

    assert_eq!(result.confidence_score, 0.0);
    assert_eq!(result.reason, ReasonCode::NoSlotFound);
    assert!(result.alternative_times.is_empty());
    assert_eq!(result.recommended_time, monday() + Duration::days(1));
    assert_eq!(result.productivity_impact, ProductivityImpact::Unknown);
}

#[tokio::test]
async fn every_candidate_includes_all_participants() {
    let source = Arc::new(InMemoryCalendarSource::new());
    source
        .add_busy(
            "alice",
            BusyInterval::new(
                monday() + Duration::hours(10),
                monday() + Duration::hours(12),
                BusyKind::Meeting,
            ),
        )
        .unwrap();

    let settings = EngineSettings::default();
    let analyzer = AvailabilityAnalyzer::new(source, None, &settings);
    let window = two_weeks();
    let team = vec!["carol".to_string(), "alice".to_string(), "bob".to_string(), "alice".to_string()];
    let profiles = analyzer.analyze(&team, &window).await;

    let generator = SlotGenerator::new(
        chrono_tz::UTC,
        settings.slot_step_minutes,
        settings.skip_weekends,
        SchedulingConstraint::with_working_hours(settings.default_working_hours),
    );
    let request = MeetingRequest::new(team, 45).search_window(window);
    let slots = generator.generate(&request, &profiles, &window).unwrap();

    assert!(!slots.is_empty());
    let expected = vec!["alice".to_string(), "bob".to_string(), "carol".to_string()];
    for slot in &slots {
        assert_eq!(slot.available_users, expected);
        assert_eq!(slot.end - slot.start, Duration::minutes(45));
        assert!(profiles.iter().all(|profile| profile.is_free(slot.start, slot.end)));
        assert!(!matches!(slot.start.weekday(), Weekday::Sat | Weekday::Sun));
    }

    let engine = ScoringEngine::new(chrono_tz::UTC);
    for meeting_type in [MeetingType::Brainstorming, MeetingType::DecisionMaking, MeetingType::ClientCall] {
        for slot in &slots {
            let score = engine.score(slot, &profiles, meeting_type);
            assert!((0.0..=1.0).contains(&score));
            assert_eq!(score, engine.score(slot, &profiles, meeting_type));
        }
    }
}

#[tokio::test]
async fn identical_requests_give_identical_results() {
    let source = InMemoryCalendarSource::new();
    source
        .add_busy(
            "alice",
            BusyInterval::new(
                monday() + Duration::hours(9),
                monday() + Duration::hours(11),
                BusyKind::Meeting,
            ),
        )
        .unwrap();
    let scheduler = engine(source);
    let request = MeetingRequest::new(participants(), 60)
        .meeting_type(MeetingType::Brainstorming)
        .search_window(two_weeks());

    let first = scheduler.find_optimal_meeting_time(&request).await.unwrap();
    let second = scheduler.find_optimal_meeting_time(&request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.reason, ReasonCode::MeetingTypeWindow);
    // Monday 09:00-11:00 is taken, so the best brainstorming slot is Monday 11:00.
    assert_eq!(first.recommended_time, monday() + Duration::hours(11));
}

#[tokio::test]
async fn weekends_only_when_enabled() {
    // 2026-03-07 is a Saturday.
    let saturday = monday() + Duration::days(5);
    let window = SearchWindow::days_from(saturday, 1).unwrap();
    let request = MeetingRequest::new(participants(), 30).search_window(window);

    let default_engine = engine(InMemoryCalendarSource::new());
    let result = default_engine.find_optimal_meeting_time(&request).await.unwrap();
    assert_eq!(result.reason, ReasonCode::NoSlotFound);

    let settings = EngineSettings {
        skip_weekends: false,
        ..EngineSettings::default()
    };
    let weekend_engine =
        SmartScheduler::new(settings, Arc::new(InMemoryCalendarSource::new()), None).unwrap();
    let result = weekend_engine.find_optimal_meeting_time(&request).await.unwrap();
    assert_eq!(result.recommended_time, saturday + Duration::hours(9));
    assert!(result.confidence_score > 0.0);
}

#[tokio::test]
async fn noon_beats_early_afternoon_for_an_idle_team() {
    let scheduler = engine(InMemoryCalendarSource::new());
    let window = SearchWindow::new(
        monday() + Duration::hours(12),
        monday() + Duration::hours(17),
    )
    .unwrap();
    let request = MeetingRequest::new(participants(), 30).search_window(window);

    let result = scheduler.find_optimal_meeting_time(&request).await.unwrap();

    assert_eq!(result.recommended_time, monday() + Duration::hours(12));
    assert!((result.confidence_score - 0.68).abs() < 1e-9);
    assert_eq!(result.reason, ReasonCode::PreLunchFocus);
    assert_eq!(result.conflict_warnings, vec![ConflictWarning::LunchOverlap]);
}

#[tokio::test]
async fn window_ending_at_midnight_still_searches_that_day() {
    let source = InMemoryCalendarSource::new();
    source
        .add_busy(
            "alice",
            BusyInterval::new(monday(), monday() + Duration::days(1), BusyKind::Meeting),
        )
        .unwrap();
    let scheduler = engine(source);
    let tuesday = monday() + Duration::days(1);
    let request = MeetingRequest::new(participants(), 30)
        .search_window(SearchWindow::new(monday(), tuesday).unwrap());

    let result = scheduler.find_optimal_meeting_time(&request).await.unwrap();

    assert_eq!(result.recommended_time, tuesday + Duration::hours(9));
    assert!(result
        .alternative_times
        .iter()
        .all(|start| *start < tuesday + Duration::days(1)));
}

#[tokio::test]
async fn local_timezone_drives_hours_and_warnings() {
    let settings = EngineSettings {
        timezone: "Europe/Belgrade".to_string(),
        ..EngineSettings::default()
    };
    let source = InMemoryCalendarSource::new();
    // Block Monday through Thursday for alice, leaving Friday.
    source
        .add_busy(
            "alice",
            BusyInterval::new(
                monday() - Duration::hours(1),
                monday() + Duration::days(4) - Duration::hours(1),
                BusyKind::Meeting,
            ),
        )
        .unwrap();
    let scheduler = SmartScheduler::new(settings, Arc::new(source), None).unwrap();
    let window = SearchWindow::new(
        monday() + Duration::days(4) + Duration::hours(14),
        monday() + Duration::days(5),
    )
    .unwrap();
    let request = MeetingRequest::new(participants(), 30).search_window(window);

    let result = scheduler.find_optimal_meeting_time(&request).await.unwrap();

    // 15:00 Belgrade time is 14:00 UTC in winter.
    let local = result.recommended_time.with_timezone(&chrono_tz::Europe::Belgrade);
    assert_eq!(local.hour(), 15);
    assert_eq!(local.weekday(), Weekday::Fri);
    assert_eq!(result.conflict_warnings, vec![ConflictWarning::FridayAfternoon]);
}

#[tokio::test]
async fn result_is_readable_from_cache() {
    let settings = EngineSettings::default();
    let cache: Arc<dyn ResultCache> = Arc::new(MemoryResultCache::from_settings(&settings));
    let scheduler = SmartScheduler::new(
        settings,
        Arc::new(InMemoryCalendarSource::new()),
        Some(cache),
    )
    .unwrap();
    let request = MeetingRequest::new(participants(), 30).search_window(two_weeks());

    assert!(scheduler.recent_result(&participants()).await.is_none());
    let result = scheduler.find_optimal_meeting_time(&request).await.unwrap();

    let reversed = vec!["bob".to_string(), "alice".to_string()];
    let cached = scheduler.recent_result(&reversed).await.unwrap();
    assert_eq!(cached.result, result);
    assert_eq!(cached.participants, participants());
}
