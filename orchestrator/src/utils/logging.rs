//! Log output. One line per event, either a coloured console table or JSON for log shippers.
//!
//! Worker spans carry the queue (`q`) and job spans the `attempt`, both are lifted into their own
//! columns so every line of a job can be traced back to its delivery.

use std::str::FromStr;

use chrono::Utc;
use serde_json::{Map, Value};
use strum_macros::EnumString;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::{OrchestratorError, OrchestratorResult};

const DEFAULT_LOG_DIRECTIVE: &str = "zkflow_orchestrator=info";

/// Shown first on console lines
const ENTITY_FIELDS: &[&str] = &["circuit_id", "proof_request_id", "job_key"];
/// Span bookkeeping that only the JSON output keeps
const CONSOLE_HIDDEN_FIELDS: &[&str] = &["q", "correlation_id", "span_type"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT`, anything unknown falls back to the console format
    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT").ok().and_then(|value| Self::from_str(value.trim()).ok()).unwrap_or(Self::Pretty)
    }
}

/// Message and fields of one span or event, in recording order
#[derive(Debug, Clone, Default)]
struct RecordedFields {
    message: Option<String>,
    values: Vec<(&'static str, Value)>,
}

impl RecordedFields {
    fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(key, _)| *key == name).map(|(_, value)| value)
    }

    fn insert(&mut self, name: &'static str, value: Value) {
        match self.values.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }
}

impl Visit for RecordedFields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let text = format!("{:?}", value).trim_matches('"').to_string();
        if field.name() == "message" {
            self.message = Some(text);
        } else {
            self.insert(field.name(), Value::String(text));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field.name(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field.name(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field.name(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field.name(), Value::from(value));
    }
}

/// Keeps the fields of every span in its extensions, including the ones recorded after creation
pub struct SpanFieldLayer;

impl<S> Layer<S> for SpanFieldLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut fields = RecordedFields::default();
        attrs.record(&mut fields);
        span.extensions_mut().insert(fields);
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<RecordedFields>() {
            Some(fields) => values.record(fields),
            None => {
                let mut fields = RecordedFields::default();
                values.record(&mut fields);
                extensions.insert(fields);
            }
        }
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Fields of the current span and its parents, innermost value first
fn span_fields<S, N>(ctx: &FmtContext<'_, S, N>) -> RecordedFields
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    let mut merged = RecordedFields::default();
    if let Some(span) = ctx.lookup_current() {
        for scope_span in span.scope() {
            if let Some(fields) = scope_span.extensions().get::<RecordedFields>() {
                for (name, value) in &fields.values {
                    if merged.get(name).is_none() {
                        merged.values.push((*name, value.clone()));
                    }
                }
            }
        }
    }
    merged
}

/// `timestamp | LEVEL | QUEUE | attempt | message (fields)`
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    const DIM: &'static str = "\x1b[90m";
    const QUEUE: &'static str = "\x1b[92m";
    const RESET: &'static str = "\x1b[0m";

    fn level_color(level: &Level) -> &'static str {
        match *level {
            Level::TRACE => "\x1b[90m",
            Level::DEBUG => "\x1b[34m",
            Level::INFO => "\x1b[32m",
            Level::WARN => "\x1b[33m",
            Level::ERROR => "\x1b[31m",
        }
    }

    fn render_fields(event: &RecordedFields) -> String {
        let (entities, rest): (Vec<_>, Vec<_>) = event
            .values
            .iter()
            .filter(|(name, _)| !CONSOLE_HIDDEN_FIELDS.contains(name))
            .partition(|(name, _)| ENTITY_FIELDS.contains(name));
        entities
            .into_iter()
            .chain(rest)
            .map(|(name, value)| format!("{}={}", name, text(value)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> std::fmt::Result {
        let level = event.metadata().level();
        let spans = span_fields(ctx);
        let queue = spans.get("q").map(|q| text(q).to_uppercase()).unwrap_or_else(|| "-".to_string());
        let attempt =
            spans.get("attempt").map(|attempt| format!("attempt {}", text(attempt))).unwrap_or_else(|| "-".to_string());

        let mut recorded = RecordedFields::default();
        event.record(&mut recorded);

        let separator = format!("{}|{}", Self::DIM, Self::RESET);
        write!(writer, "{} {} ", Utc::now().format("%y-%m-%d %H:%M:%S"), separator)?;
        write!(writer, "{}{:<5}{} {} ", Self::level_color(level), level, Self::RESET, separator)?;
        write!(writer, "{}{:<16}{} {} ", Self::QUEUE, queue, Self::RESET, separator)?;
        write!(writer, "{:<10} {} ", attempt, separator)?;
        write!(writer, "{}", recorded.message.as_deref().unwrap_or_default())?;

        let fields = Self::render_fields(&recorded);
        if !fields.is_empty() {
            write!(writer, " {}({}){}", Self::DIM, fields, Self::RESET)?;
        }
        writeln!(writer)
    }
}

/// One JSON object per line. Span fields are merged under `fields` without overriding event fields.
pub struct JsonFormatter;

impl<S, N> FormatEvent<S, N> for JsonFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> std::fmt::Result {
        let meta = event.metadata();
        let mut recorded = RecordedFields::default();
        event.record(&mut recorded);

        let mut root = Map::new();
        root.insert("timestamp".to_string(), Value::String(Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)));
        root.insert("level".to_string(), Value::String(meta.level().to_string()));
        root.insert("target".to_string(), Value::String(meta.target().to_string()));
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            root.insert("location".to_string(), Value::String(format!("{}:{}", file, line)));
        }
        if let Some(message) = recorded.message.take() {
            root.insert("message".to_string(), Value::String(message));
        }
        if let Some(span) = ctx.lookup_current() {
            root.insert("span".to_string(), Value::String(span.metadata().name().to_string()));
        }

        let mut fields: Map<String, Value> =
            recorded.values.into_iter().map(|(name, value)| (name.to_string(), value)).collect();
        for (name, value) in span_fields(ctx).values {
            fields.entry(name.to_string()).or_insert(value);
        }
        if !fields.is_empty() {
            root.insert("fields".to_string(), Value::Object(fields));
        }

        let line = serde_json::to_string(&Value::Object(root)).map_err(|_| std::fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

fn env_filter() -> OrchestratorResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::builder()
            .with_default_directive(Level::INFO.into())
            .parse(DEFAULT_LOG_DIRECTIVE)
            .map_err(|e| OrchestratorError::SetupError(format!("Invalid log filter directive: {}", e))),
    }
}

/// Install the global subscriber (`RUST_LOG` filter, `LOG_FORMAT` output, span traces for errors)
/// and color_eyre's panic and error report hooks.
pub fn init_logging() -> OrchestratorResult<()> {
    color_eyre::install().map_err(|e| OrchestratorError::SetupError(format!("Unable to install color_eyre: {}", e)))?;

    let registry = Registry::default().with(env_filter()?).with(SpanFieldLayer).with(ErrorLayer::default());
    let result = match LogFormat::from_env() {
        LogFormat::Json => tracing::subscriber::set_global_default(registry.with(fmt::layer().event_format(JsonFormatter))),
        LogFormat::Pretty => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().event_format(ConsoleFormatter)))
        }
    };
    result.map_err(|e| OrchestratorError::SetupError(format!("Failed to set global default subscriber: {}", e)))
}
