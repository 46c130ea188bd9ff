//! Per-request view handed to controller hooks and actions

use axum::{
    RequestPartsExt,
    body::Body,
    extract::{RawPathParams, Request},
    http::{HeaderMap, Method, Uri, request::Parts},
};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{DispatchError, DispatchResult};
use crate::middleware::RequestParams;
use crate::route::RouteInfo;

/// Request as seen by a controller
///
/// The body is fully buffered. Query/body parameters come from the param
/// middleware when it is installed, otherwise they are parsed here.
#[derive(Debug)]
pub struct RouteRequest {
    pub parts: Parts,
    pub body: Bytes,
    params: Arc<RequestParams>,
    path_params: HashMap<String, String>,
    route: Arc<RouteInfo>,
}

impl RouteRequest {
    /// Buffer an incoming request for dispatch
    pub async fn from_request(request: Request<Body>, route: Arc<RouteInfo>) -> DispatchResult<Self> {
        let (mut parts, body) = request.into_parts();

        let path_params = match parts.extract::<RawPathParams>().await {
            Ok(raw) => raw
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            Err(_) => HashMap::new(),
        };

        let body = body
            .collect()
            .await
            .map_err(|e| DispatchError::BadRequest(format!("Failed to read request body: {e}")))?
            .to_bytes();

        let params = match parts.extensions.get::<Arc<RequestParams>>() {
            Some(params) => params.clone(),
            None => {
                let content_type = parts
                    .headers
                    .get(http::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok());
                Arc::new(RequestParams::parse(parts.uri.query(), content_type, &body)?)
            }
        };

        Ok(Self {
            parts,
            body,
            params,
            path_params,
            route,
        })
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Route this request was dispatched to
    pub fn route(&self) -> &RouteInfo {
        &self.route
    }

    /// Named path parameter (`/users/:id` → `id`)
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Query parameter, then body parameter; HTML-encoded when `sanitize`
    pub fn get_param(&self, key: &str, sanitize: bool) -> Option<Value> {
        self.params.get_param(key, sanitize)
    }

    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    /// Deserialize the JSON body
    pub fn json<T: DeserializeOwned>(&self) -> DispatchResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Typed request extension (e.g. inserted by an outer layer)
    pub fn extension<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.parts.extensions.get::<T>().cloned()
    }
}
