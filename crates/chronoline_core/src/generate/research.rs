//! Research prompt construction and response parsing.

use crate::import::image_url::normalize_image_url;
use crate::import::sheet::{DEFAULT_IMPORTANCE, MAX_IMPORTANCE, MIN_IMPORTANCE};
use crate::model::event::{importance_from_json, parse_event_date, TimelineEvent};
use crate::rank::normalize::normalize;
use crate::retry::{retry_with_backoff, RetryError, RetryPolicy, Sleeper};
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MIN_REQUESTED_EVENTS: usize = 1;
const MAX_REQUESTED_EVENTS: usize = 100;

/// Failures of the generation path.
#[derive(Debug)]
pub enum GenerationError {
    /// Topic was blank after trimming.
    EmptyTopic,
    /// Reply held no JSON array of events.
    InvalidResponse(String),
    /// Reply parsed but no entry survived validation.
    NoEvents,
    /// The service call failed after all retries.
    Service(RetryError<ServiceError>),
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTopic => write!(f, "research topic must not be empty"),
            Self::InvalidResponse(message) => write!(f, "invalid research response: {message}"),
            Self::NoEvents => write!(f, "research response contained no usable events"),
            Self::Service(err) => write!(f, "research request failed: {err}"),
        }
    }
}

impl Error for GenerationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Service(err) => Some(err),
            _ => None,
        }
    }
}

/// Failure reported by a `ResearchClient` (quota, transport, vendor error).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ServiceError {}

/// Text-generation backend. Supplied by the embedding app.
pub trait ResearchClient {
    fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// Entry shape as produced by the model; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneratedEntry {
    date: Option<Value>,
    title: Option<String>,
    description: Option<String>,
    #[serde(alias = "imageUrl", alias = "image")]
    image_url: Option<String>,
    #[serde(alias = "absImportance", alias = "abs_importance")]
    importance: Option<Value>,
}

/// Builds the instruction sent to the research model.
pub fn build_research_prompt(topic: &str, max_events: usize) -> String {
    let count = max_events.clamp(MIN_REQUESTED_EVENTS, MAX_REQUESTED_EVENTS);
    format!(
        "Research the history of \"{topic}\" and list up to {count} key events.\n\
         Respond with only a JSON array. Each element must be an object with:\n\
         - \"date\": \"YYYY-MM-DD\" (use -01-01 when only the year is known)\n\
         - \"title\": short headline\n\
         - \"description\": one or two sentences\n\
         - \"imageUrl\": a Wikimedia Commons file name or URL, or empty\n\
         - \"importance\": integer 1-100 rating absolute historical significance\n\
         Order the array chronologically.",
        topic = topic.trim(),
    )
}

/// Parses a model reply into ranked events.
///
/// Accepts a bare JSON array, an object with an `events` array, and either
/// wrapped in markdown code fences or surrounded by prose.
pub fn parse_generated_events(text: &str) -> Result<Vec<TimelineEvent>, GenerationError> {
    let value = parse_json_payload(text)?;

    let entries = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("events") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(GenerationError::InvalidResponse(
                    "object reply has no `events` array".to_string(),
                ))
            }
        },
        _ => {
            return Err(GenerationError::InvalidResponse(
                "reply is not an array".to_string(),
            ))
        }
    };

    let mut events = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match event_from_entry(entry) {
            Some(event) => events.push(event),
            None => warn!(
                "event=generated_entry_dropped module=generate status=skip index={}",
                index
            ),
        }
    }

    if events.is_empty() {
        return Err(GenerationError::NoEvents);
    }

    info!(
        "event=parse_generated module=generate status=ok count={}",
        events.len()
    );
    Ok(normalize(events))
}

/// Prompts `client` with retry and parses the reply.
pub fn research_events(
    client: &dyn ResearchClient,
    topic: &str,
    max_events: usize,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<Vec<TimelineEvent>, GenerationError> {
    if topic.trim().is_empty() {
        return Err(GenerationError::EmptyTopic);
    }
    let prompt = build_research_prompt(topic, max_events);
    let reply = retry_with_backoff(policy, sleeper, |_| client.complete(&prompt))
        .map_err(GenerationError::Service)?;
    parse_generated_events(&reply)
}

fn event_from_entry(entry: Value) -> Option<TimelineEvent> {
    let entry: GeneratedEntry = serde_json::from_value(entry).ok()?;

    let date = match entry.date? {
        Value::String(text) => parse_event_date(&text)?,
        Value::Number(number) => parse_event_date(&number.as_i64()?.to_string())?,
        _ => return None,
    };
    let title = entry.title.map(|title| title.trim().to_string())?;
    if title.is_empty() {
        return None;
    }

    let importance = entry
        .importance
        .as_ref()
        .and_then(importance_from_json)
        .map(|value| value.clamp(MIN_IMPORTANCE, MAX_IMPORTANCE))
        .unwrap_or(DEFAULT_IMPORTANCE);

    let mut event = TimelineEvent::new(date, title)
        .with_description(entry.description.unwrap_or_default().trim())
        .with_importance(importance);
    event.image_url = entry.image_url.as_deref().and_then(normalize_image_url);
    Some(event)
}

/// Parses the JSON document inside a model reply.
///
/// Tries the span opened by whichever bracket kind appears first, then the
/// other kind, so stray braces in leading prose do not hide the payload.
fn parse_json_payload(text: &str) -> Result<Value, GenerationError> {
    let unfenced = strip_code_fence(text.trim());
    let mut first_error = None;
    for candidate in json_candidates(unfenced) {
        match serde_json::from_str(candidate) {
            Ok(value) => return Ok(value),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    Err(GenerationError::InvalidResponse(match first_error {
        Some(err) => err.to_string(),
        None => "no JSON payload found".to_string(),
    }))
}

/// Bracket-delimited spans that may hold the payload, earliest opener first.
fn json_candidates(text: &str) -> Vec<&str> {
    let mut spans: Vec<(usize, &str)> = [('[', ']'), ('{', '}')]
        .into_iter()
        .filter_map(|(open, close)| {
            let start = text.find(open)?;
            let end = text.rfind(close)?;
            (end > start).then(|| (start, &text[start..=end]))
        })
        .collect();
    spans.sort_by_key(|(start, _)| *start);
    spans.into_iter().map(|(_, span)| span).collect()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
