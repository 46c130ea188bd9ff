//! Request parameter middleware
//!
//! Installed once over the whole router. It buffers the request body, parses
//! query and body parameters and attaches a [`RequestParams`] to the request
//! extensions, so every handler can call
//! `get_param(key, sanitize)` without re-parsing.
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use waav_controllers::middleware::param_middleware;
//!
//! let app = Router::new()
//!     .route("/search", get(search))
//!     .layer(axum::middleware::from_fn_with_state(
//!         state.clone(),
//!         param_middleware,
//!     ));
//! ```

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::CONTENT_TYPE, request::Parts},
    middleware::Next,
    response::Response,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use crate::errors::{DispatchError, DispatchResult};
use crate::state::AppState;

/// HTML-encode markup characters; non-ASCII characters become numeric entities
pub fn html_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c if !c.is_ascii() => out.push_str(&format!("&#{};", c as u32)),
            _ => out.push(ch),
        }
    }
    out
}

/// Recursively HTML-encode every string leaf; object keys are encoded too
pub fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(html_encode(s)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (html_encode(k), sanitize_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Query and body parameters of one request
///
/// Sanitized lookups are memoized per key for the lifetime of the request.
#[derive(Debug, Default)]
pub struct RequestParams {
    query: Map<String, Value>,
    body: Map<String, Value>,
    sanitized: Mutex<Option<HashMap<String, Value>>>,
}

impl RequestParams {
    pub fn new(query: Map<String, Value>, body: Map<String, Value>) -> Self {
        Self {
            query,
            body,
            sanitized: Mutex::new(None),
        }
    }

    /// Parse the query string and, for form or JSON content types, the body
    pub fn parse(
        query: Option<&str>,
        content_type: Option<&str>,
        body: &[u8],
    ) -> DispatchResult<Self> {
        let query = query
            .map(|q| parse_urlencoded(q.as_bytes()))
            .unwrap_or_default();

        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();

        let body = if body.is_empty() {
            Map::new()
        } else if mime == "application/x-www-form-urlencoded" {
            parse_urlencoded(body)
        } else if mime == "application/json" || mime.ends_with("+json") {
            match serde_json::from_slice::<Value>(body)? {
                Value::Object(map) => map,
                _ => Map::new(),
            }
        } else {
            Map::new()
        };

        Ok(Self::new(query, body))
    }

    /// Look up `key` in the query parameters, then the body parameters.
    ///
    /// With `sanitize` the value is HTML-encoded and cached; without it the raw
    /// value is returned and the cache is not touched.
    pub fn get_param(&self, key: &str, sanitize: bool) -> Option<Value> {
        if !sanitize {
            return self.raw(key).cloned();
        }

        let mut cache = self.sanitized.lock();
        if let Some(hit) = cache.as_ref().and_then(|c| c.get(key)) {
            return Some(hit.clone());
        }

        let clean = sanitize_value(self.raw(key)?);
        cache
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), clean.clone());
        Some(clean)
    }

    /// Sanitized string parameter, if present and a string
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get_param(key, true)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether a sanitized value for `key` is cached
    pub fn is_cached(&self, key: &str) -> bool {
        self.sanitized
            .lock()
            .as_ref()
            .is_some_and(|c| c.contains_key(key))
    }

    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    fn raw(&self, key: &str) -> Option<&Value> {
        self.query.get(key).or_else(|| self.body.get(key))
    }
}

/// Parse `application/x-www-form-urlencoded` data.
///
/// Bracket keys build nested values: `user[name]=a` yields
/// `{"user": {"name": "a"}}` and `tags[]=a&tags[]=b` yields an array.
/// Repeated plain keys collect into an array.
pub fn parse_urlencoded(input: &[u8]) -> Map<String, Value> {
    let mut root = Value::Object(Map::new());
    for (key, value) in url::form_urlencoded::parse(input) {
        let segments = split_key(&key);
        assign(&mut root, &segments, Value::String(value.into_owned()));
    }
    match root {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Deepest bracket nesting honored in form keys; brackets past it stay part
/// of a literal key
const MAX_KEY_DEPTH: usize = 5;

fn split_key(key: &str) -> Vec<String> {
    let open = match key.find('[') {
        Some(open) if open > 0 => open,
        _ => return vec![key.to_string()],
    };

    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while segments.len() <= MAX_KEY_DEPTH {
        let Some(inner) = rest.strip_prefix('[') else {
            break;
        };
        let Some(close) = inner.find(']') else {
            break;
        };
        segments.push(inner[..close].to_string());
        rest = &inner[close + 1..];
    }

    if segments.len() == 1 {
        return vec![key.to_string()];
    }
    if !rest.is_empty() {
        segments.push(rest.to_string());
    }
    segments
}

fn assign(slot: &mut Value, segments: &[String], value: Value) {
    let Some((segment, rest)) = segments.split_first() else {
        merge_leaf(slot, value);
        return;
    };

    if segment.is_empty() {
        if !slot.is_array() {
            *slot = match slot.take() {
                Value::Null => Value::Array(Vec::new()),
                previous => Value::Array(vec![previous]),
            };
        }
        if let Value::Array(items) = slot {
            let mut child = Value::Null;
            assign(&mut child, rest, value);
            items.push(child);
        }
        return;
    }

    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        let child = map.entry(segment.clone()).or_insert(Value::Null);
        assign(child, rest, value);
    }
}

fn merge_leaf(slot: &mut Value, value: Value) {
    match slot {
        Value::Null => *slot = value,
        Value::Array(items) => items.push(value),
        existing => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, value]);
        }
    }
}

/// Middleware that attaches [`RequestParams`] to every request
///
/// The body is buffered up to `controllers.max_param_body_bytes` and handed
/// on unchanged. Oversized bodies are rejected with 413, malformed JSON with
/// 400.
pub async fn param_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, DispatchError> {
    let limit = state.config.controllers.max_param_body_bytes;
    let (parts, body) = request.into_parts();

    let body_bytes = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                DispatchError::status(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
            } else {
                DispatchError::BadRequest(format!("Failed to read request body: {e}"))
            }
        })?
        .to_bytes();

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let params = RequestParams::parse(parts.uri.query(), content_type, &body_bytes)?;

    tracing::debug!(
        path = %parts.uri.path(),
        query_params = params.query().len(),
        body_params = params.body().len(),
        "Request params attached"
    );

    let mut request = Request::from_parts(parts, Body::from(body_bytes));
    request.extensions_mut().insert(Arc::new(params));
    Ok(next.run(request).await)
}

/// Extractor for the request's [`RequestParams`]
///
/// Falls back to query-only params when the middleware is not installed.
#[derive(Debug, Clone)]
pub struct Params(pub Arc<RequestParams>);

impl<S: Send + Sync> FromRequestParts<S> for Params {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(params) = parts.extensions.get::<Arc<RequestParams>>() {
            return Ok(Params(params.clone()));
        }
        let query = parts
            .uri
            .query()
            .map(|q| parse_urlencoded(q.as_bytes()))
            .unwrap_or_default();
        Ok(Params(Arc::new(RequestParams::new(query, Map::new()))))
    }
}

impl std::ops::Deref for Params {
    type Target = RequestParams;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
