use chrono::NaiveDate;
use chronoline_core::{
    parse_event_date, DisplayTier, EventValidationError, TimelineDocument, TimelineEvent,
};
use serde_json::json;
use uuid::Uuid;

#[test]
fn event_serializes_with_camel_case_wire_names() {
    let mut event = TimelineEvent::new(NaiveDate::from_ymd_opt(1989, 11, 9).unwrap(), "Wall falls")
        .with_description("Berlin")
        .with_importance(88);
    event.display_tier = DisplayTier::new(9);
    event.image_url = Some("https://example.com/wall.jpg".to_string());

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["date"], "1989-11-09");
    assert_eq!(value["importance"], 88);
    assert_eq!(value["displayTier"], 9);
    assert_eq!(value["imageUrl"], "https://example.com/wall.jpg");
    assert_eq!(value["id"], event.id.to_string());
}

#[test]
fn event_deserialization_is_lenient_about_importance() {
    let id = Uuid::new_v4();
    let parsed: TimelineEvent = serde_json::from_value(json!({
        "id": id,
        "date": "1066-10-14",
        "title": "Hastings",
        "importance": "72.5"
    }))
    .unwrap();
    assert_eq!(parsed.raw_importance, Some(73));
    assert_eq!(parsed.description, "");
    assert_eq!(parsed.display_tier, None);

    let parsed: TimelineEvent = serde_json::from_value(json!({
        "id": id,
        "date": "1066-10-14",
        "title": "Hastings",
        "importance": "unknown"
    }))
    .unwrap();
    assert_eq!(parsed.raw_importance, None);
    assert_eq!(parsed.importance_key(), 0);
}

#[test]
fn invalid_persisted_tiers_load_as_unranked() {
    for bad_tier in [json!(0), json!(11), json!(300), json!(-2), json!("7"), json!(4.5)] {
        let parsed: TimelineEvent = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "date": "1066-10-14",
            "title": "Hastings",
            "displayTier": bad_tier
        }))
        .unwrap();
        assert_eq!(parsed.display_tier, None, "tier {bad_tier}");
        assert_eq!(parsed.effective_tier(), DisplayTier::MIN);
    }

    let parsed: TimelineEvent = serde_json::from_value(json!({
        "id": Uuid::new_v4(),
        "date": "1066-10-14",
        "title": "Hastings",
        "displayTier": 7
    }))
    .unwrap();
    assert_eq!(parsed.display_tier, DisplayTier::new(7));
}

#[test]
fn one_bad_event_field_does_not_fail_the_document() {
    let mut document = TimelineDocument::new("Norman conquest", 1_000);
    document
        .events
        .push(TimelineEvent::new(NaiveDate::from_ymd_opt(1066, 10, 14).unwrap(), "Hastings"));
    let mut value = serde_json::to_value(&document).unwrap();
    value["events"][0]["importance"] = json!("lots");
    value["events"][0]["displayTier"] = json!(0);

    let parsed: TimelineDocument = serde_json::from_value(value).unwrap();
    assert_eq!(parsed.events.len(), 1);
    assert_eq!(parsed.events[0].raw_importance, None);
    assert_eq!(parsed.events[0].display_tier, None);
}

#[test]
fn with_id_validates_identity_and_title() {
    let date = NaiveDate::from_ymd_opt(1600, 1, 1).unwrap();
    assert_eq!(
        TimelineEvent::with_id(Uuid::nil(), date, "x").unwrap_err(),
        EventValidationError::NilId
    );
    assert_eq!(
        TimelineEvent::with_id(Uuid::new_v4(), date, "  ").unwrap_err(),
        EventValidationError::EmptyTitle
    );
    let id = Uuid::new_v4();
    assert_eq!(TimelineEvent::with_id(id, date, "ok").unwrap().id, id);
}

#[test]
fn loose_dates_parse_with_defaults() {
    let ymd = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
    assert_eq!(parse_event_date("1969-07-20"), ymd(1969, 7, 20));
    assert_eq!(parse_event_date("1969/07/20"), ymd(1969, 7, 20));
    assert_eq!(parse_event_date("1969-07"), ymd(1969, 7, 1));
    assert_eq!(parse_event_date(" 1969 "), ymd(1969, 1, 1));
    assert_eq!(parse_event_date("1969-07-20T20:17:00Z"), ymd(1969, 7, 20));
    assert_eq!(parse_event_date("-500"), ymd(-500, 1, 1));
    assert_eq!(parse_event_date("1969-13-01"), None);
    assert_eq!(parse_event_date("July 1969"), None);
    assert_eq!(parse_event_date(""), None);
}

#[test]
fn document_roundtrip_keeps_summary_fields() {
    let mut document = TimelineDocument::new("Cold War", 1_000);
    document
        .events
        .push(TimelineEvent::new(NaiveDate::from_ymd_opt(1961, 8, 13).unwrap(), "Wall built"));

    let json = serde_json::to_string(&document).unwrap();
    assert!(json.contains("\"updatedAtMs\":1000"));
    let parsed: TimelineDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, document);

    let summary = parsed.summary();
    assert_eq!(summary.id.as_str(), "cold-war-1000");
    assert_eq!(summary.event_count, 1);
}
