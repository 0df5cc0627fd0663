use chronoline_core::{
    build_research_prompt, parse_generated_events, research_events, GenerationError,
    ResearchClient, RetryPolicy, ServiceError, Sleeper,
};
use std::cell::{Cell, RefCell};
use std::time::Duration;

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

struct ScriptedClient {
    replies: RefCell<Vec<Result<String, ServiceError>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedClient {
    fn new(mut replies: Vec<Result<String, ServiceError>>) -> Self {
        replies.reverse();
        Self {
            replies: RefCell::new(replies),
            prompts: RefCell::new(Vec::new()),
        }
    }
}

impl ResearchClient for ScriptedClient {
    fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.replies
            .borrow_mut()
            .pop()
            .unwrap_or_else(|| Err(ServiceError::new("script exhausted")))
    }
}

const FENCED_REPLY: &str = "```json
[
  {\"date\": \"1969-07-20\", \"title\": \"Apollo 11\", \"description\": \"First crewed landing\", \"imageUrl\": \"File:Aldrin.jpg\", \"importance\": 98},
  {\"date\": \"1957-10-04\", \"title\": \"Sputnik 1\", \"description\": \"First satellite\", \"importance\": \"85\"},
  {\"date\": \"1961\", \"title\": \"Vostok 1\", \"importance\": 90.4}
]
```";

#[test]
fn parses_fenced_array_into_ranked_chronological_events() {
    let events = parse_generated_events(FENCED_REPLY).unwrap();

    let titles: Vec<&str> = events.iter().map(|event| event.title.as_str()).collect();
    assert_eq!(titles, vec!["Sputnik 1", "Vostok 1", "Apollo 11"]);

    let scores: Vec<u32> = events.iter().map(|event| event.importance_key()).collect();
    assert_eq!(scores, vec![85, 90, 98]);

    let tiers: Vec<u8> = events
        .iter()
        .map(|event| event.display_tier.unwrap().get())
        .collect();
    assert_eq!(tiers, vec![4, 7, 10]);

    assert_eq!(
        events[2].image_url.as_deref(),
        Some("https://commons.wikimedia.org/wiki/Special:FilePath/Aldrin.jpg")
    );
    assert_eq!(events[1].description, "");
}

#[test]
fn accepts_events_object_and_surrounding_prose() {
    let reply = "Sure! Here is the timeline:\n\
                 {\"events\": [{\"date\": \"1492-10-12\", \"title\": \"Landfall\", \"absImportance\": 70}]}\n\
                 Let me know if you need more.";

    let events = parse_generated_events(reply).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].raw_importance, Some(70));
    assert_eq!(events[0].year(), 1492);
}

#[test]
fn braces_in_preamble_do_not_hide_the_array() {
    let reply = "Here are {n} events: [\
                 {\"date\": \"1815-06-18\", \"title\": \"Waterloo\", \"importance\": 80},\
                 {\"date\": \"1805-10-21\", \"title\": \"Trafalgar\", \"importance\": 60}]";

    let events = parse_generated_events(reply).unwrap();
    let titles: Vec<&str> = events.iter().map(|event| event.title.as_str()).collect();
    assert_eq!(titles, vec!["Trafalgar", "Waterloo"]);
}

#[test]
fn importance_is_clamped_and_defaulted() {
    let reply = r#"[
        {"date": "1900", "title": "huge", "importance": 1000},
        {"date": "1901", "title": "negative", "importance": -5},
        {"date": "1902", "title": "missing"},
        {"date": "1903", "title": "zero", "importance": 0}
    ]"#;

    let events = parse_generated_events(reply).unwrap();
    let scores: Vec<Option<u32>> = events.iter().map(|event| event.raw_importance).collect();
    assert_eq!(scores, vec![Some(100), Some(50), Some(50), Some(1)]);
}

#[test]
fn invalid_entries_are_dropped() {
    let reply = r#"[
        {"date": "not a date", "title": "bad date"},
        {"date": "1800", "title": "   "},
        {"title": "no date"},
        "just a string",
        {"date": 1815, "title": "Waterloo"}
    ]"#;

    let events = parse_generated_events(reply).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Waterloo");
    assert_eq!(events[0].year(), 1815);
}

#[test]
fn reply_without_usable_entries_is_no_events() {
    let err = parse_generated_events(r#"[{"title": "undated"}]"#).unwrap_err();
    assert!(matches!(err, GenerationError::NoEvents));

    let err = parse_generated_events("[]").unwrap_err();
    assert!(matches!(err, GenerationError::NoEvents));
}

#[test]
fn non_json_reply_is_invalid_response() {
    let err = parse_generated_events("I could not find anything.").unwrap_err();
    assert!(matches!(err, GenerationError::InvalidResponse(_)));

    let err = parse_generated_events(r#"{"timeline": []}"#).unwrap_err();
    assert!(matches!(err, GenerationError::InvalidResponse(_)));
}

#[test]
fn prompt_names_topic_and_clamps_count() {
    let prompt = build_research_prompt("  The Space Race ", 500);
    assert!(prompt.contains("\"The Space Race\""));
    assert!(prompt.contains("up to 100 key events"));
    assert!(prompt.contains("JSON array"));

    assert!(build_research_prompt("x", 0).contains("up to 1 key events"));
}

#[test]
fn research_retries_service_failures() {
    let client = ScriptedClient::new(vec![
        Err(ServiceError::new("quota exceeded")),
        Ok(FENCED_REPLY.to_string()),
    ]);
    let attempts = Cell::new(0);
    let counting = CountingSleeper(&attempts);

    let events = research_events(
        &client,
        "space race",
        20,
        &RetryPolicy::default(),
        &counting,
    )
    .unwrap();

    assert_eq!(events.len(), 3);
    assert_eq!(attempts.get(), 1);
    let prompts = client.prompts.borrow();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0], prompts[1]);
}

#[test]
fn research_surfaces_exhausted_service_error() {
    let client = ScriptedClient::new(Vec::new());
    let policy = RetryPolicy {
        max_attempts: 2,
        ..RetryPolicy::default()
    };

    let err = research_events(&client, "anything", 10, &policy, &NoSleep).unwrap_err();
    match err {
        GenerationError::Service(retry) => assert_eq!(retry.attempts(), 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn blank_topic_is_rejected_before_calling_service() {
    let client = ScriptedClient::new(Vec::new());
    let err = research_events(&client, "  ", 10, &RetryPolicy::no_retry(), &NoSleep).unwrap_err();

    assert!(matches!(err, GenerationError::EmptyTopic));
    assert!(client.prompts.borrow().is_empty());
}

struct CountingSleeper<'a>(&'a Cell<u32>);

impl Sleeper for CountingSleeper<'_> {
    fn sleep(&self, _duration: Duration) {
        self.0.set(self.0.get() + 1);
    }
}
