//! Request helper for the Featurebase REST API.
//!
//! Every endpoint goes through [`FeaturebaseClient::request`], which owns the
//! URL building, parameter encoding and error mapping:
//!
//! - query parameters and form bodies drop `null` values, repeat the key for
//!   every array element and use bracket keys (`author[name]`) for nested
//!   objects
//! - a `GET` with a body appends the body to the query string
//! - responses are parsed as JSON, falling back to the raw text

use std::fmt;

use flowblocks::{Context, Result, debug, ensure};
use reqwest::{Method, Url};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::FeaturebaseConfig;

/// Base URL used when the app configuration does not set one.
pub const DEFAULT_BASE_URL: &str = "https://do.featurebase.app";

const API_KEY_HEADER: &str = "X-API-Key";

/// Errors returned by [`FeaturebaseClient::request`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FeaturebaseError {
    /// Featurebase answered with a non-2xx status.
    #[error("Featurebase API error: {status} {status_text}")]
    Api {
        status: u16,
        status_text: String,
        /// Parsed response body (JSON, or the raw text).
        body: Value,
    },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The base URL and endpoint do not form a valid URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// Request parameters could not be turned into a JSON object.
    #[error("failed to encode request parameters: {0}")]
    Encode(#[from] serde_json::Error),
}

impl FeaturebaseError {
    /// HTTP status of an [`FeaturebaseError::Api`] error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Encoding of a request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentType {
    /// `application/x-www-form-urlencoded`
    #[default]
    Form,
    /// `application/json`
    Json,
}

/// Method, parameters and body encoding of one request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Map<String, Value>>,
    pub query: Option<Map<String, Value>>,
    pub content_type: ContentType,
    /// Path segments appended to the endpoint, percent-encoded.
    pub segments: Vec<String>,
}

impl RequestOptions {
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    #[must_use]
    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = Some(query);
        self
    }

    /// Appends one percent-encoded path segment, such as a resource id.
    #[must_use]
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Sends the body as JSON instead of a form.
    #[must_use]
    pub fn json(mut self) -> Self {
        self.content_type = ContentType::Json;
        self
    }
}

/// Authenticated client for one Featurebase organization.
#[derive(Clone)]
pub struct FeaturebaseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for FeaturebaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeaturebaseClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl FeaturebaseClient {
    /// Creates a client for `base_url`, or [`DEFAULT_BASE_URL`] when it is
    /// absent or blank.
    ///
    /// # Errors
    ///
    /// Returns [`FeaturebaseError::InvalidUrl`] if the base URL does not parse.
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<&str>,
    ) -> Result<Self, FeaturebaseError> {
        let base_url = normalize_base_url(base_url);
        Url::parse(&base_url)
            .map_err(|e| FeaturebaseError::InvalidUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Builds a client from the connector's app configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the app configuration is missing, the API key is
    /// blank, or the base URL is invalid.
    pub fn from_ctx(ctx: &Context) -> Result<Self> {
        let config = FeaturebaseConfig::get(ctx)?;
        ensure!(!config.api_key.trim().is_empty(), "apiKey must not be empty");

        Ok(Self::new(config.api_key, config.base_url.as_deref())?)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one request to `endpoint` (a path such as `/v2/posts`) followed
    /// by the option's extra path segments.
    ///
    /// # Errors
    ///
    /// Returns [`FeaturebaseError::Api`] for non-2xx responses and
    /// [`FeaturebaseError::Network`] when no response was received.
    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Value, FeaturebaseError> {
        let RequestOptions {
            method,
            body,
            query,
            content_type,
            segments,
        } = options;

        let url = format!("{}{}", self.base_url, endpoint);
        let mut url =
            Url::parse(&url).map_err(|e| FeaturebaseError::InvalidUrl(format!("{url}: {e}")))?;
        if !segments.is_empty() {
            let Ok(mut path) = url.path_segments_mut() else {
                return Err(FeaturebaseError::InvalidUrl(format!(
                    "{endpoint}: cannot append path segments"
                )));
            };
            path.pop_if_empty().extend(&segments);
        }

        let mut query_pairs = query.as_ref().map(encode_pairs).unwrap_or_default();
        if method == Method::GET
            && let Some(body) = &body
        {
            query_pairs.extend(encode_pairs(body));
        }

        debug!(method = %method, endpoint, "Sending Featurebase request");

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(API_KEY_HEADER, &self.api_key);
        if !query_pairs.is_empty() {
            request = request.query(&query_pairs);
        }
        if method != Method::GET
            && let Some(body) = &body
        {
            request = match content_type {
                ContentType::Json => request.json(body),
                ContentType::Form => request.form(&encode_pairs(body)),
            };
        }

        let response = request
            .send()
            .await
            .map_err(|e| FeaturebaseError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FeaturebaseError::Network(e.to_string()))?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if status.is_success() {
            Ok(body)
        } else {
            Err(FeaturebaseError::Api {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            })
        }
    }
}

/// Removes `null`-valued keys in place and hands the same map back.
pub fn clean_params(params: &mut Map<String, Value>) -> &mut Map<String, Value> {
    params.retain(|_, value| !value.is_null());
    params
}

/// Serializes typed parameters into the JSON object the request helper
/// encodes.
///
/// # Errors
///
/// Returns [`FeaturebaseError::Encode`] if `params` does not serialize to a
/// JSON object.
pub fn to_params<T: Serialize + ?Sized>(
    params: &T,
) -> Result<Map<String, Value>, FeaturebaseError> {
    match serde_json::to_value(params)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(FeaturebaseError::Encode(serde::ser::Error::custom(format!(
            "expected an object, got {other}"
        )))),
    }
}

fn normalize_base_url(base_url: Option<&str>) -> String {
    base_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_BASE_URL)
        .trim_end_matches('/')
        .to_string()
}

fn encode_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        push_pairs(&mut pairs, key.clone(), value);
    }
    pairs
}

fn push_pairs(pairs: &mut Vec<(String, String)>, key: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => pairs.push((key, flag.to_string())),
        Value::Number(number) => pairs.push((key, number.to_string())),
        Value::String(text) => pairs.push((key, text.clone())),
        Value::Array(items) => {
            for item in items {
                push_pairs(pairs, key.clone(), item);
            }
        }
        Value::Object(fields) => {
            for (field, nested) in fields {
                push_pairs(pairs, format!("{key}[{field}]"), nested);
            }
        }
    }
}
