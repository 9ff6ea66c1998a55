// api-probe-core/src/runtime/synthesizer.rs
// ============================================================================
// Module: Request Synthesizer
// Description: Schema- and live-data-driven request construction.
// Purpose: Build concrete, replayable requests for catalog endpoints.
// Dependencies: crate::{core, interfaces}, rand, uuid
// ============================================================================

//! ## Overview
//! The synthesizer turns an endpoint declaration into concrete requests.
//! Identifier-looking path parameters are filled from live store keys when
//! one can be found, falling back to schema-driven generation. The generator
//! is seeded: the same seed, catalog, and live data yield the same request
//! sequence, which keeps failures replayable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::Rng;
use rand::SeedableRng;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::core::cancel::CancelToken;
use crate::core::catalog::Catalog;
use crate::core::endpoint::Endpoint;
use crate::core::endpoint::MediaTypeBody;
use crate::core::endpoint::Parameter;
use crate::core::endpoint::ParameterLocation;
use crate::core::message::Request;
use crate::core::message::RequestBody;
use crate::core::schema::Schema;
use crate::core::schema::StringFormat;
use crate::core::schema::StringSchema;
use crate::interfaces::StateSource;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default `User-Agent` attached to synthesized requests.
const USER_AGENT: &str = "api-probe/0.1";
/// Maximum schema recursion depth during generation.
const MAX_VALUE_DEPTH: usize = 8;
/// Probability of including an optional object field.
const OPTIONAL_FIELD_PROBABILITY: f64 = 0.7;
/// Cap applied to pattern-derived repetition counts.
const MAX_PATTERN_REPEATS: usize = 20;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Synthesis errors; a failed request is dropped, the run continues.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// No value could be produced for a required path parameter.
    #[error("no value for required path parameter {0}")]
    MissingPathValue(String),
}

// ============================================================================
// SECTION: Synthesizer
// ============================================================================

/// Seeded request synthesizer over one catalog and state source.
pub struct RequestSynthesizer<'a> {
    /// Endpoint catalog for schema resolution.
    catalog: &'a Catalog,
    /// Live state source for identifier lookups.
    state: &'a dyn StateSource,
    /// Seeded randomness source.
    rng: StdRng,
}

impl<'a> RequestSynthesizer<'a> {
    /// Creates a synthesizer with a deterministic seed.
    #[must_use]
    pub fn new(catalog: &'a Catalog, state: &'a dyn StateSource, seed: u64) -> Self {
        Self {
            catalog,
            state,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Builds up to `k` requests for an endpoint.
    ///
    /// Requests that cannot be completed (typically a required path
    /// parameter with no producible value) are dropped and logged.
    pub fn synthesize(
        &mut self,
        endpoint: &Endpoint,
        k: usize,
        cancel: &CancelToken,
    ) -> Vec<Request> {
        let mut requests = Vec::with_capacity(k);
        for _ in 0 .. k {
            if cancel.is_cancelled() {
                break;
            }
            match self.synthesize_one(endpoint) {
                Ok(request) => requests.push(request),
                Err(err) => {
                    debug!(
                        method = endpoint.method.as_str(),
                        path = endpoint.path_template.as_str(),
                        error = %err,
                        "dropping unsynthesizable request"
                    );
                }
            }
        }
        requests
    }

    /// Builds one request for an endpoint.
    fn synthesize_one(&mut self, endpoint: &Endpoint) -> Result<Request, SynthesisError> {
        let path = self.concrete_path(endpoint)?;

        let mut query = Vec::new();
        let mut headers = Vec::new();
        for parameter in &endpoint.parameters {
            match parameter.location {
                ParameterLocation::Query => {
                    let value = self.parameter_value(parameter);
                    query.push((parameter.name.clone(), render_scalar(&value)));
                }
                ParameterLocation::Header => {
                    let value = self.parameter_value(parameter);
                    headers.push((parameter.name.clone(), render_scalar(&value)));
                }
                ParameterLocation::Path | ParameterLocation::Cookie => {}
            }
        }
        if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("user-agent")) {
            headers.push(("User-Agent".to_string(), USER_AGENT.to_string()));
        }

        let body = if endpoint.method.carries_body() {
            self.body_for(endpoint)
        } else {
            None
        };

        Ok(Request {
            method: endpoint.method,
            path,
            query,
            headers,
            body,
        })
    }

    // ------------------------------------------------------------------
    // Path construction
    // ------------------------------------------------------------------

    /// Renders the concrete path, filling every `{name}` segment.
    fn concrete_path(&mut self, endpoint: &Endpoint) -> Result<String, SynthesisError> {
        let segments: Vec<String> = endpoint
            .path_template
            .split('/')
            .map(str::to_string)
            .collect();
        let mut rendered = Vec::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            let Some(name) =
                segment.strip_prefix('{').and_then(|inner| inner.strip_suffix('}'))
            else {
                rendered.push(segment.clone());
                continue;
            };
            let parameter = endpoint
                .parameters
                .iter()
                .find(|param| param.location == ParameterLocation::Path && param.name == name);
            let value = match parameter {
                Some(parameter) => self.path_parameter_value(parameter, &segments, index),
                None => Some(self.random_alphanumeric(8)),
            };
            match value {
                Some(value) => rendered.push(value),
                None => return Err(SynthesisError::MissingPathValue(name.to_string())),
            }
        }
        Ok(rendered.join("/"))
    }

    /// Produces a path parameter value: live key first, schema second.
    fn path_parameter_value(
        &mut self,
        parameter: &Parameter,
        segments: &[String],
        segment_index: usize,
    ) -> Option<String> {
        if looks_like_identifier(parameter, &self.catalog.resolve(&parameter.schema)) {
            let stem = identifier_stem(&parameter.name)
                .or_else(|| preceding_literal_stem(segments, segment_index));
            if let Some(stem) = stem {
                if let Some(key) = self.live_key(&stem) {
                    return Some(key);
                }
            }
        }
        let value = self.value_from_schema(&parameter.schema, 0);
        let rendered = sanitize_path_segment(&render_scalar(&value));
        if rendered.is_empty() {
            None
        } else {
            Some(rendered)
        }
    }

    /// Fetches a live key for the kind whose name contains the stem.
    fn live_key(&mut self, stem: &str) -> Option<String> {
        let descriptors = self.state.entity_kinds().ok()?;
        let descriptor = descriptors
            .iter()
            .find(|descriptor| descriptor.name.as_str().to_lowercase().contains(stem))?;
        let key = self.state.random_key(&descriptor.name).ok()??;
        let rendered = sanitize_path_segment(&render_scalar(&key));
        if rendered.is_empty() {
            None
        } else {
            Some(rendered)
        }
    }

    // ------------------------------------------------------------------
    // Bodies
    // ------------------------------------------------------------------

    /// Generates a request body, preferring JSON media types.
    fn body_for(&mut self, endpoint: &Endpoint) -> Option<RequestBody> {
        let declarations = &endpoint.request_bodies;
        if declarations.is_empty() {
            return None;
        }
        let declaration: &MediaTypeBody = declarations
            .iter()
            .find(|body| body.media_type.contains("json"))
            .unwrap_or(&declarations[0]);
        let value = self.value_from_schema(&declaration.schema, 0);
        let bytes = if declaration.media_type.contains("json") {
            serde_json::to_vec(&value).unwrap_or_default()
        } else if declaration.media_type.contains("xml") {
            xml_body(&value).into_bytes()
        } else {
            render_scalar(&value).into_bytes()
        };
        Some(RequestBody {
            bytes,
            media_type: declaration.media_type.clone(),
        })
    }

    // ------------------------------------------------------------------
    // Schema-driven values
    // ------------------------------------------------------------------

    /// Generates a value for a parameter, honoring a document example first.
    fn parameter_value(&mut self, parameter: &Parameter) -> Value {
        if let Some(example) = &parameter.example {
            return example.clone();
        }
        self.value_from_schema(&parameter.schema, 0)
    }

    /// Generates a JSON value satisfying the schema constraints.
    fn value_from_schema(&mut self, schema: &Schema, depth: usize) -> Value {
        if depth > MAX_VALUE_DEPTH {
            return Value::Null;
        }
        let resolved = self.catalog.resolve(schema);
        match resolved {
            Schema::String(string) => Value::String(self.string_value(&string)),
            Schema::Integer(integer) => {
                let low = integer.minimum.unwrap_or(1);
                let high = integer.maximum.unwrap_or(1000).max(low);
                Value::Number(self.rng.gen_range(low ..= high).into())
            }
            Schema::Number(number) => {
                let low = number.minimum.unwrap_or(0.0);
                let high = number.maximum.unwrap_or(1000.0).max(low);
                let drawn = if high > low {
                    self.rng.gen_range(low .. high)
                } else {
                    low
                };
                serde_json::Number::from_f64(drawn).map_or(Value::Null, Value::Number)
            }
            Schema::Boolean => Value::Bool(self.rng.gen()),
            Schema::Array(array) => {
                let length = self.rng.gen_range(1 ..= 3);
                let items = (0 .. length)
                    .map(|_| self.value_from_schema(&array.items, depth + 1))
                    .collect();
                Value::Array(items)
            }
            Schema::Object(object) => {
                let mut map = serde_json::Map::new();
                for field in &object.fields {
                    let include = object.is_required(&field.name)
                        || self.rng.gen_bool(OPTIONAL_FIELD_PROBABILITY);
                    let value = self.value_from_schema(&field.schema, depth + 1);
                    if include {
                        map.insert(field.name.clone(), value);
                    }
                }
                Value::Object(map)
            }
            // `resolve` degrades unresolvable references to a string schema,
            // so a surviving reference means the chain hit the depth limit.
            Schema::Ref(_) => Value::String(self.random_alphanumeric(8)),
        }
    }

    /// Generates a string honoring enum, format, pattern, and length bounds.
    fn string_value(&mut self, schema: &StringSchema) -> String {
        if !schema.enum_values.is_empty() {
            let index = self.rng.gen_range(0 .. schema.enum_values.len());
            return schema.enum_values[index].clone();
        }
        if let Some(format) = &schema.format {
            if let Some(value) = self.format_value(format) {
                return value;
            }
        }
        if let Some(pattern) = &schema.pattern {
            if let Some(pieces) = parse_pattern(pattern) {
                return self.generate_from_pieces(&pieces);
            }
        }
        let low = schema.min_length.unwrap_or(1).max(1);
        let high = schema.max_length.unwrap_or(20).min(50).max(low);
        let length = self.rng.gen_range(low ..= high);
        self.random_alphanumeric(length)
    }

    /// Produces a well-formed example for known formats.
    fn format_value(&mut self, format: &StringFormat) -> Option<String> {
        match format {
            StringFormat::Email => {
                Some(format!("{}@example.com", self.random_alphanumeric(8).to_lowercase()))
            }
            StringFormat::Date => Some(self.date_value()),
            StringFormat::DateTime => {
                let date = self.date_value();
                Some(format!(
                    "{date}T{:02}:{:02}:{:02}Z",
                    self.rng.gen_range(0 ..= 23u32),
                    self.rng.gen_range(0 ..= 59u32),
                    self.rng.gen_range(0 ..= 59u32)
                ))
            }
            StringFormat::Uuid => Some(Uuid::from_u128(self.rng.gen()).to_string()),
            StringFormat::Uri => {
                Some(format!("https://example.com/{}", self.random_alphanumeric(8).to_lowercase()))
            }
            StringFormat::Password => Some(self.random_alphanumeric(16)),
            StringFormat::Other(_) => None,
        }
    }

    /// Renders a calendar-safe RFC 3339 date.
    fn date_value(&mut self) -> String {
        format!(
            "{:04}-{:02}-{:02}",
            self.rng.gen_range(2000 ..= 2030u32),
            self.rng.gen_range(1 ..= 12u32),
            self.rng.gen_range(1 ..= 28u32)
        )
    }

    /// Draws a random alphanumeric string of the given length.
    fn random_alphanumeric(&mut self, length: usize) -> String {
        (&mut self.rng).sample_iter(Alphanumeric).take(length).map(char::from).collect()
    }

    /// Generates a string from parsed pattern pieces.
    fn generate_from_pieces(&mut self, pieces: &[PatternPiece]) -> String {
        let mut out = String::new();
        for piece in pieces {
            let count = self.rng.gen_range(piece.min ..= piece.max.max(piece.min));
            for _ in 0 .. count {
                match &piece.atom {
                    PatternAtom::Literal(ch) => out.push(*ch),
                    PatternAtom::Any => {
                        out.push(char::from((&mut self.rng).sample(Alphanumeric)));
                    }
                    PatternAtom::Set(ranges) => {
                        if let Some(ch) = self.char_from_ranges(ranges) {
                            out.push(ch);
                        }
                    }
                }
            }
        }
        out
    }

    /// Draws one character from inclusive character ranges.
    fn char_from_ranges(&mut self, ranges: &[(char, char)]) -> Option<char> {
        let total: u32 = ranges
            .iter()
            .map(|(start, end)| u32::from(*end).saturating_sub(u32::from(*start)) + 1)
            .sum();
        if total == 0 {
            return None;
        }
        let mut index = self.rng.gen_range(0 .. total);
        for (start, end) in ranges {
            let span = u32::from(*end) - u32::from(*start) + 1;
            if index < span {
                return char::from_u32(u32::from(*start) + index);
            }
            index -= span;
        }
        None
    }
}

// ============================================================================
// SECTION: Identifier Heuristics
// ============================================================================

/// Returns true when a path parameter looks like a store identifier.
fn looks_like_identifier(parameter: &Parameter, resolved: &Schema) -> bool {
    let name = parameter.name.to_lowercase();
    if name == "id" || name.ends_with("id") {
        return true;
    }
    name.contains("id") && matches!(resolved, Schema::String(_) | Schema::Integer(_))
}

/// Derives the semantic stem of an identifier parameter name.
///
/// `userId` and `user_id` both reduce to `user`; a bare `id` has no stem.
fn identifier_stem(name: &str) -> Option<String> {
    let lowered = name.to_lowercase();
    let stripped = lowered.strip_suffix("id").unwrap_or(&lowered);
    let stem: String = stripped.chars().filter(|ch| *ch != '_' && *ch != '-').collect();
    if stem.is_empty() {
        None
    } else {
        Some(stem)
    }
}

/// Falls back to the nearest literal path segment before the parameter.
fn preceding_literal_stem(segments: &[String], index: usize) -> Option<String> {
    segments[.. index]
        .iter()
        .rev()
        .find(|segment| !segment.is_empty() && !segment.starts_with('{'))
        .map(|segment| segment.to_lowercase())
}

/// Keeps only path-safe characters.
fn sanitize_path_segment(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
        .collect()
}

// ============================================================================
// SECTION: Scalar Rendering
// ============================================================================

/// Renders a JSON value as a query, header, or path scalar.
#[must_use]
pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) => {
            items.iter().map(render_scalar).collect::<Vec<_>>().join(",")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Renders a naive XML document for non-JSON body media types.
fn xml_body(value: &Value) -> String {
    fn render(value: &Value, out: &mut String) {
        match value {
            Value::Object(map) => {
                for (name, inner) in map {
                    out.push('<');
                    out.push_str(name);
                    out.push('>');
                    render(inner, out);
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
            }
            Value::Array(items) => {
                for item in items {
                    out.push_str("<item>");
                    render(item, out);
                    out.push_str("</item>");
                }
            }
            other => out.push_str(&render_scalar(other)),
        }
    }
    let mut out = String::from("<root>");
    render(value, &mut out);
    out.push_str("</root>");
    out
}

// ============================================================================
// SECTION: Pattern Approximation
// ============================================================================

/// One generated atom of a regex approximation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternAtom {
    /// A literal character.
    Literal(char),
    /// Any character (approximated as alphanumeric).
    Any,
    /// A character drawn from inclusive ranges.
    Set(Vec<(char, char)>),
}

/// An atom plus its repetition bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PatternPiece {
    atom: PatternAtom,
    min: usize,
    max: usize,
}

/// Parses a restricted regex dialect into generatable pieces.
///
/// Supported: literals, escapes (`\d`, `\w`, `\s`, escaped metacharacters),
/// `.`, positive character classes with ranges, and the quantifiers `?`,
/// `*`, `+`, `{n}`, `{n,m}`. Anything else (groups, alternation, negated
/// classes) returns `None` and the caller falls back to random output.
fn parse_pattern(pattern: &str) -> Option<Vec<PatternPiece>> {
    let mut pieces: Vec<PatternPiece> = Vec::new();
    let mut chars = pattern.chars().peekable();

    if chars.peek() == Some(&'^') {
        chars.next();
    }

    while let Some(ch) = chars.next() {
        match ch {
            '$' => {
                return if chars.next().is_none() { Some(pieces) } else { None };
            }
            '(' | ')' | '|' => return None,
            '\\' => {
                let escaped = chars.next()?;
                let atom = match escaped {
                    'd' => PatternAtom::Set(vec![('0', '9')]),
                    'w' => PatternAtom::Set(vec![('a', 'z'), ('A', 'Z'), ('0', '9'), ('_', '_')]),
                    's' => PatternAtom::Literal(' '),
                    other => PatternAtom::Literal(other),
                };
                pieces.push(PatternPiece {
                    atom,
                    min: 1,
                    max: 1,
                });
            }
            '[' => {
                let atom = parse_class(&mut chars)?;
                pieces.push(PatternPiece {
                    atom,
                    min: 1,
                    max: 1,
                });
            }
            '.' => pieces.push(PatternPiece {
                atom: PatternAtom::Any,
                min: 1,
                max: 1,
            }),
            '?' => apply_quantifier(&mut pieces, 0, 1)?,
            '*' => apply_quantifier(&mut pieces, 0, 3)?,
            '+' => apply_quantifier(&mut pieces, 1, 3)?,
            '{' => {
                let (min, max) = parse_bounds(&mut chars)?;
                apply_quantifier(&mut pieces, min, max)?;
            }
            other => pieces.push(PatternPiece {
                atom: PatternAtom::Literal(other),
                min: 1,
                max: 1,
            }),
        }
    }
    Some(pieces)
}

/// Parses a positive character class body.
fn parse_class(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<PatternAtom> {
    if chars.peek() == Some(&'^') {
        return None;
    }
    let mut ranges: Vec<(char, char)> = Vec::new();
    let mut pending: Option<char> = None;
    loop {
        let ch = chars.next()?;
        match ch {
            ']' => {
                if let Some(single) = pending {
                    ranges.push((single, single));
                }
                return if ranges.is_empty() { None } else { Some(PatternAtom::Set(ranges)) };
            }
            '\\' => {
                if let Some(single) = pending.take() {
                    ranges.push((single, single));
                }
                match chars.next()? {
                    'd' => ranges.push(('0', '9')),
                    'w' => {
                        ranges.push(('a', 'z'));
                        ranges.push(('A', 'Z'));
                        ranges.push(('0', '9'));
                        ranges.push(('_', '_'));
                    }
                    other => pending = Some(other),
                }
            }
            '-' => match (pending.take(), chars.peek()) {
                (Some(start), Some(&end)) if end != ']' => {
                    chars.next();
                    if start > end {
                        return None;
                    }
                    ranges.push((start, end));
                }
                // A dash with no surrounding operands is a literal dash.
                (start, _) => {
                    if let Some(single) = start {
                        ranges.push((single, single));
                    }
                    ranges.push(('-', '-'));
                }
            },
            other => {
                if let Some(single) = pending.take() {
                    ranges.push((single, single));
                }
                pending = Some(other);
            }
        }
    }
}

/// Parses `{n}` or `{n,m}` repetition bounds.
fn parse_bounds(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<(usize, usize)> {
    let mut min_text = String::new();
    let mut max_text = String::new();
    let mut in_max = false;
    loop {
        let ch = chars.next()?;
        match ch {
            '}' => break,
            ',' if !in_max => in_max = true,
            digit if digit.is_ascii_digit() => {
                if in_max {
                    max_text.push(digit);
                } else {
                    min_text.push(digit);
                }
            }
            _ => return None,
        }
    }
    let min: usize = min_text.parse().ok()?;
    let max = if in_max {
        if max_text.is_empty() {
            min + 3
        } else {
            max_text.parse().ok()?
        }
    } else {
        min
    };
    if max < min {
        return None;
    }
    Some((min.min(MAX_PATTERN_REPEATS), max.min(MAX_PATTERN_REPEATS)))
}

/// Applies repetition bounds to the most recent piece.
fn apply_quantifier(pieces: &mut [PatternPiece], min: usize, max: usize) -> Option<()> {
    let last = pieces.last_mut()?;
    last.min = min;
    last.max = max;
    Some(())
}
