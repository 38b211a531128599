//! End-to-end visibility tests against the fixture configuration

use std::sync::{Arc, Once};

use chrono::NaiveDate;
use zman_core::{
    BuilderConfig, DayOffset, InMemoryConfigStore, Location, StaticCalendar, TagConfigLoader,
    TagSource, VisibilityEngine, VisibilityState, ZmanError,
};

const FIXTURE: &str = include_str!("fixtures/tag_config.json");

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_york() -> Location {
    Location::new(40.7128, -74.0060, "America/New_York")
}

/// Tishrei 5786 and a few other dates
fn calendar() -> StaticCalendar {
    StaticCalendar::new()
        .with_events(date(2025, 9, 23), ["Rosh Hashana 5786"])
        .with_events(date(2025, 9, 24), ["Rosh Hashana II"])
        .with_events(date(2025, 9, 25), ["Tzom Gedaliah"])
        .with_events(date(2025, 10, 2), ["Yom Kippur"])
        .with_events(date(2025, 10, 7), ["Sukkot I"])
        .with_events(date(2025, 10, 8), ["Sukkot II"])
        .with_events(date(2025, 12, 16), ["Chanukah: 3 Candles"])
        .with_events(date(2026, 4, 2), ["Pesach I"])
}

async fn engine_with(
    calendar: Arc<StaticCalendar>,
) -> VisibilityEngine<StaticCalendar, InMemoryConfigStore> {
    init_tracing();
    let store = InMemoryConfigStore::from_json(FIXTURE).unwrap();
    VisibilityEngine::new(calendar, Arc::new(store), BuilderConfig::default())
        .await
        .unwrap()
}

async fn engine() -> VisibilityEngine<StaticCalendar, InMemoryConfigStore> {
    engine_with(Arc::new(calendar())).await
}

async fn shown(
    engine: &VisibilityEngine<StaticCalendar, InMemoryConfigStore>,
    item: &str,
    on: NaiveDate,
) -> bool {
    engine.compute_visibility(item, on, &new_york()).await.unwrap()
}

#[test]
fn test_fixture_loads() {
    let config = TagConfigLoader::new().load_from_json(FIXTURE).unwrap();

    assert_eq!(config.catalog().len(), 14);
    assert!(config.catalog().is_full_restriction("yom_kippur"));
    assert!(!config.catalog().is_full_restriction("fast_day"));
}

#[test]
fn test_fixture_loads_from_file() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/tag_config.json");
    let mut loader = TagConfigLoader::new();
    let config = loader.load_from_file(path).unwrap();

    assert_eq!(config.mappings().len(), 14);
    assert!(loader.reload().is_ok());
}

#[tokio::test]
async fn test_erev_yom_kippur() {
    let engine = engine().await;
    let erev = date(2025, 10, 1);

    let tags = engine.active_tags(erev, &new_york()).await;
    assert!(tags.contains("erev_yom_kippur"));

    assert!(shown(&engine, "candle_lighting", erev).await);
    assert!(!shown(&engine, "havdalah", erev).await);
    assert!(!shown(&engine, "fast_begins", erev).await);
    assert!(shown(&engine, "mincha_gedola", erev).await);
}

#[tokio::test]
async fn test_yom_kippur_day() {
    let engine = engine().await;
    let day = date(2025, 10, 2);

    let resolution = engine.resolve_active_tags(day, &new_york()).await;
    assert!(resolution.tags.contains("yom_kippur"));
    assert!(resolution.tags.contains("fast_day"));
    assert_eq!(
        resolution.sources_of("fast_day"),
        &[TagSource::Event("Yom Kippur".to_string())]
    );

    assert!(!shown(&engine, "candle_lighting", day).await);
    assert!(!shown(&engine, "havdalah", day).await);
    // Negated yom_kippur wins over the active fast_day
    assert!(!shown(&engine, "fast_begins", day).await);
    assert!(shown(&engine, "fast_ends", day).await);
    assert!(!shown(&engine, "mincha_gedola", day).await);

    let decision = engine
        .evaluate("fast_begins", day, &new_york())
        .await
        .unwrap();
    assert_eq!(decision.state, VisibilityState::ForceHide);
    assert_eq!(decision.excluded_by.as_deref(), Some("yom_kippur"));
}

#[tokio::test]
async fn test_friday_after_yom_kippur() {
    let engine = engine().await;
    let friday = date(2025, 10, 3);

    let tags = engine.active_tags(friday, &new_york()).await;
    let keys: Vec<&str> = tags.iter().map(String::as_str).collect();
    assert_eq!(keys, vec!["erev_shabbos", "motzei_yom_kippur"]);

    assert!(shown(&engine, "candle_lighting", friday).await);
    assert!(shown(&engine, "havdalah", friday).await);
}

#[tokio::test]
async fn test_shabbos() {
    let engine = engine().await;
    let saturday = date(2025, 10, 4);

    assert!(!shown(&engine, "candle_lighting", saturday).await);
    assert!(shown(&engine, "havdalah", saturday).await);
    // No qualifying tags at all
    assert!(shown(&engine, "plag_hamincha", saturday).await);
}

#[tokio::test]
async fn test_rosh_hashanah_and_fast() {
    let engine = engine().await;

    let first_day = engine.active_tags(date(2025, 9, 23), &new_york()).await;
    assert!(first_day.contains("rosh_hashanah"));
    assert!(first_day.contains("erev_rosh_hashanah"));

    // Second day: yesterday was rosh_hashanah, tomorrow is only a fast
    let second_day = engine.active_tags(date(2025, 9, 24), &new_york()).await;
    assert!(second_day.contains("rosh_hashanah"));
    assert!(second_day.contains("motzei_rosh_hashanah"));
    assert!(!second_day.contains("erev_rosh_hashanah"));

    let fast = date(2025, 9, 25);
    assert!(shown(&engine, "fast_begins", fast).await);
    assert!(shown(&engine, "fast_ends", fast).await);
    assert!(!shown(&engine, "candle_lighting", fast).await);
}

#[tokio::test]
async fn test_suppress_within_observance() {
    init_tracing();
    let store = InMemoryConfigStore::from_json(FIXTURE).unwrap();
    let engine = VisibilityEngine::new(
        Arc::new(calendar()),
        Arc::new(store),
        BuilderConfig::new().with_suppress_within_observance(true),
    )
    .await
    .unwrap();

    let first_day = engine.active_tags(date(2025, 9, 23), &new_york()).await;
    assert!(first_day.contains("rosh_hashanah"));
    assert!(!first_day.contains("erev_rosh_hashanah"));

    // The first day of the observance has no candle lighting of its own
    assert!(!shown(&engine, "candle_lighting", date(2025, 9, 23)).await);
    assert!(shown(&engine, "candle_lighting", date(2025, 9, 22)).await);
}

#[tokio::test]
async fn test_sukkos_and_pesach() {
    let engine = engine().await;

    assert!(shown(&engine, "candle_lighting", date(2025, 10, 6)).await);
    let first_day = engine.active_tags(date(2025, 10, 7), &new_york()).await;
    assert!(first_day.contains("sukkos"));
    assert!(first_day.contains("yom_tov"));

    let erev_pesach = date(2026, 4, 1);
    assert!(shown(&engine, "sof_zman_achilas_chametz", erev_pesach).await);
    assert!(!shown(&engine, "sof_zman_achilas_chametz", date(2026, 4, 2)).await);
    assert!(!shown(&engine, "sof_zman_achilas_chametz", date(2025, 10, 6)).await);
}

#[tokio::test]
async fn test_chanukah() {
    let engine = engine().await;

    assert!(shown(&engine, "chanukah_candles", date(2025, 12, 16)).await);
    assert!(!shown(&engine, "chanukah_candles", date(2025, 12, 30)).await);
}

#[tokio::test]
async fn test_batch() {
    let calendar = Arc::new(calendar());
    let engine = engine_with(Arc::clone(&calendar)).await;

    let items = vec![
        "candle_lighting".to_string(),
        "havdalah".to_string(),
        "fast_begins".to_string(),
        "fast_ends".to_string(),
        "mincha_gedola".to_string(),
        "plag_hamincha".to_string(),
    ];
    let results = engine
        .compute_visibility_batch(&items, date(2025, 10, 2), &new_york())
        .await
        .unwrap();

    assert_eq!(results.len(), items.len());
    assert!(!results["candle_lighting"]);
    assert!(!results["havdalah"]);
    assert!(!results["fast_begins"]);
    assert!(results["fast_ends"]);
    assert!(!results["mincha_gedola"]);
    assert!(results["plag_hamincha"]);

    // One Active-Tag-Set: today, tomorrow, yesterday
    assert_eq!(calendar.fetch_count(), 3);

    // Batch agrees with the single-item path
    for item in &items {
        assert_eq!(results[item], shown(&engine, item, date(2025, 10, 2)).await);
    }
}

#[tokio::test]
async fn test_calendar_outage_degrades() {
    let calendar = Arc::new(calendar().with_failure(date(2025, 10, 2)));
    let engine = engine_with(Arc::clone(&calendar)).await;

    let resolution = engine.resolve_active_tags(date(2025, 10, 3), &new_york()).await;
    assert!(resolution.is_degraded());
    assert_eq!(resolution.degraded[0].offset, DayOffset::Yesterday);
    assert!(resolution.tags.contains("erev_shabbos"));
    assert!(!resolution.tags.contains("motzei_yom_kippur"));

    // Day-of-week tags still drive visibility
    assert!(shown(&engine, "candle_lighting", date(2025, 10, 3)).await);
    assert!(!shown(&engine, "havdalah", date(2025, 10, 3)).await);

    calendar.recover(date(2025, 10, 2));
    assert!(shown(&engine, "havdalah", date(2025, 10, 3)).await);
}

#[tokio::test]
async fn test_israel_location() {
    let engine = engine().await;
    let jerusalem = Location::new(31.7683, 35.2137, "Asia/Jerusalem");
    assert!(jerusalem.is_israel);

    assert!(engine
        .compute_visibility("candle_lighting", date(2025, 10, 1), &jerusalem)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_broken_fixture_fails_fast() {
    let broken = FIXTURE.replace("\"pattern\": \"Purim\"", "\"pattern\": \"\"");
    let store = InMemoryConfigStore::from_json(&broken).unwrap();

    let result =
        VisibilityEngine::new(Arc::new(calendar()), Arc::new(store), BuilderConfig::default())
            .await;

    match result {
        Err(ZmanError::InvalidConfiguration { reason }) => assert!(reason.contains("E003")),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("engine built from broken configuration"),
    }
}

#[tokio::test]
async fn test_visible_tags() {
    let engine = engine().await;
    let visible: Vec<String> = engine.visible_tags().into_iter().map(|t| t.key).collect();

    assert!(visible.contains(&"yom_kippur".to_string()));
    assert!(!visible.contains(&"fast_day".to_string()));
    assert!(!visible.contains(&"yom_tov".to_string()));
}
