//! Inbound webhook dispatch.
//!
//! [`handle_webhook`] is the single HTTP entrypoint for Featurebase
//! deliveries: it checks the signature, validates the envelope against its
//! topic, and forwards the event to every subscription block registered for
//! that topic. It always answers with a [`WebhookResponse`]; nothing escapes
//! to the transport layer.

use std::{collections::BTreeMap, fmt};

use flowblocks::{BlockHost, JsonSchema, error, info, schemars, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::security::verify_featurebase_webhook;

pub const WEBHOOK_PATH: &str = "/";
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";

/// Webhook topics Featurebase delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    PostCreated,
    PostUpdated,
    PostDeleted,
    PostVoted,
    ChangelogPublished,
    CommentCreated,
    CommentUpdated,
    CommentDeleted,
}

impl Topic {
    pub const ALL: [Self; 8] = [
        Self::PostCreated,
        Self::PostUpdated,
        Self::PostDeleted,
        Self::PostVoted,
        Self::ChangelogPublished,
        Self::CommentCreated,
        Self::CommentUpdated,
        Self::CommentDeleted,
    ];

    /// Looks up a topic by its wire name, e.g. `post.created`.
    #[must_use]
    pub fn parse(topic: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == topic)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PostCreated => "post.created",
            Self::PostUpdated => "post.updated",
            Self::PostDeleted => "post.deleted",
            Self::PostVoted => "post.voted",
            Self::ChangelogPublished => "changelog.published",
            Self::CommentCreated => "comment.created",
            Self::CommentUpdated => "comment.updated",
            Self::CommentDeleted => "comment.deleted",
        }
    }

    /// The `data.item.type` tag an envelope for this topic must carry.
    #[must_use]
    pub const fn item_type(self) -> &'static str {
        match self {
            Self::PostCreated | Self::PostUpdated | Self::PostDeleted => "post",
            Self::PostVoted => "post_vote",
            Self::ChangelogPublished => "changelog",
            Self::CommentCreated | Self::CommentUpdated | Self::CommentDeleted => "comment",
        }
    }

    /// Id of the subscription block that receives this topic.
    #[must_use]
    pub const fn block_type_id(self) -> &'static str {
        match self {
            Self::PostCreated => "postCreatedSubscription",
            Self::PostUpdated => "postUpdatedSubscription",
            Self::PostDeleted => "postDeletedSubscription",
            Self::PostVoted => "postVotedSubscription",
            Self::ChangelogPublished => "changelogPublishedSubscription",
            Self::CommentCreated => "commentCreatedSubscription",
            Self::CommentUpdated => "commentUpdatedSubscription",
            Self::CommentDeleted => "commentDeletedSubscription",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level webhook body.
///
/// Only `topic` and `data.item` are relied on. Metadata is kept as sent and
/// fields not listed here are collected in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEnvelope {
    /// Always `notification` for event deliveries.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    /// Event topic, e.g. `post.created`.
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Value>,
    pub data: EventData,
    /// Unique event ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_status: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Event payload: the affected resource and, for updates, what changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventData {
    /// Post, comment, changelog or vote, tagged by its `type` field.
    pub item: Value,
    /// List of `{field, oldValue, newValue}` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Checks that `payload` is a well-formed envelope for `topic`.
///
/// # Errors
///
/// Returns `Invalid <topic> event payload` when `data.item.type` does not
/// match the topic or the envelope does not deserialize.
pub fn validate_envelope(topic: Topic, payload: &Value) -> Result<WebhookEnvelope, String> {
    let invalid = || format!("Invalid {topic} event payload");

    let item_type = payload
        .pointer("/data/item/type")
        .and_then(Value::as_str)
        .ok_or_else(invalid)?;
    if item_type != topic.item_type() {
        return Err(invalid());
    }

    let envelope: WebhookEnvelope =
        serde_json::from_value(payload.clone()).map_err(|_| invalid())?;
    if envelope.topic != topic.as_str() {
        return Err(invalid());
    }
    Ok(envelope)
}

/// An inbound HTTP request, already read off the wire.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    /// Raw body, exactly as signed.
    pub body: String,
}

impl WebhookRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: Value,
}

impl WebhookResponse {
    fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "error": message.into() }))
    }
}

/// Handles one webhook delivery.
///
/// Subscribers are looked up through `host` by the topic's subscription
/// block id and receive `{"body": {"headers": ..., "payload": <envelope>}}`.
pub async fn handle_webhook(
    request: &WebhookRequest,
    webhook_secret: Option<&str>,
    host: &dyn BlockHost,
) -> WebhookResponse {
    match dispatch(request, webhook_secret, host).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "Webhook dispatch failed");
            WebhookResponse::error(500, format!("Internal server error: {e}"))
        }
    }
}

async fn dispatch(
    request: &WebhookRequest,
    webhook_secret: Option<&str>,
    host: &dyn BlockHost,
) -> flowblocks::Result<WebhookResponse> {
    if request.path != WEBHOOK_PATH {
        return Ok(WebhookResponse::error(404, "Not found"));
    }
    if !request.method.eq_ignore_ascii_case("POST") {
        return Ok(WebhookResponse::error(405, "Method not allowed"));
    }

    let (Some(signature), Some(timestamp)) = (
        request.header(SIGNATURE_HEADER),
        request.header(TIMESTAMP_HEADER),
    ) else {
        warn!("Rejected webhook without signature headers");
        return Ok(WebhookResponse::error(
            400,
            "Missing required webhook headers (X-Webhook-Signature, X-Webhook-Timestamp)",
        ));
    };

    let Some(secret) = webhook_secret.filter(|s| !s.is_empty()) else {
        warn!("Rejected webhook because no webhook secret is configured");
        return Ok(WebhookResponse::error(400, "Webhook secret not configured"));
    };

    let verification = verify_featurebase_webhook(signature, timestamp, &request.body, secret);
    if !verification.is_valid {
        let reason = verification.error.unwrap_or_default();
        warn!(reason = %reason, "Webhook verification failed");
        return Ok(WebhookResponse::error(
            401,
            format!("Webhook verification failed: {reason}"),
        ));
    }

    let payload: Value = serde_json::from_str(&request.body)?;
    let topic_value = payload.get("topic").cloned().unwrap_or(Value::Null);

    let Some(topic) = topic_value.as_str().and_then(Topic::parse) else {
        info!(topic = %topic_value, "Ignoring unsupported webhook topic");
        return Ok(WebhookResponse::new(
            200,
            json!({ "message": "Event type not supported", "topic": topic_value }),
        ));
    };

    let envelope = match validate_envelope(topic, &payload) {
        Ok(envelope) => envelope,
        Err(message) => {
            warn!(topic = %topic, "Rejected malformed webhook payload");
            return Ok(WebhookResponse::error(400, message));
        }
    };

    let subscribers = host.list_subscribers(topic.block_type_id()).await?;
    if subscribers.is_empty() {
        info!(topic = %topic, "No subscription blocks for webhook topic");
        return Ok(WebhookResponse::new(
            200,
            json!({ "message": "No subscription blocks found", "topic": topic.as_str() }),
        ));
    }

    let event_id = envelope
        .id
        .as_ref()
        .map(|id| id.as_str().map_or_else(|| id.to_string(), str::to_string))
        .unwrap_or_default();
    let message = json!({
        "body": {
            "headers": request.headers,
            "payload": payload,
        }
    });
    host.send_to_blocks(message, &subscribers).await?;

    info!(
        topic = %topic,
        event_id = %event_id,
        blocks = subscribers.len(),
        "Forwarded webhook to subscription blocks"
    );
    Ok(WebhookResponse::new(
        200,
        json!({
            "message": "ok",
            "topic": topic.as_str(),
            "blocksNotified": subscribers.len(),
        }),
    ))
}
