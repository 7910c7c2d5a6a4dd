//! Webhook subscription blocks.
//!
//! [`crate::webhook::handle_webhook`] forwards each verified delivery to the
//! subscription blocks registered for its topic. Each block reshapes the
//! event item into its output event. A block that receives a delivery for a
//! different topic emits nothing.

use std::collections::BTreeMap;

use flowblocks::{Context, JsonSchema, Result, block, schemars};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    schemas::{Change, EventChangelog, EventComment, EventPost, EventVote},
    webhook::{Topic, WebhookEnvelope},
};

const USER_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("email", "email"),
    ("name", "name"),
    ("profilePicture", "profilePicture"),
    ("verified", "verified"),
    ("type", "type"),
];

const POST_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("title", "title"),
    ("content", "content"),
    ("slug", "slug"),
    ("upvotes", "upvotes"),
    ("commentCount", "commentCount"),
    ("pinned", "pinned"),
    ("commentsAllowed", "commentsAllowed"),
    ("date", "date"),
    ("lastModified", "lastModified"),
    ("lastUpvoted", "lastUpvoted"),
];

const POST_STATUS_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("color", "color"),
    ("type", "type"),
    ("isDefault", "isDefault"),
    ("id", "id"),
];

// Boards carry their display name under `category`.
const POST_CATEGORY_FIELDS: &[(&str, &str)] = &[
    ("name", "category"),
    ("private", "private"),
    ("icon", "icon"),
    ("id", "id"),
];

const COMMENT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("content", "content"),
    ("isPrivate", "isPrivate"),
    ("score", "score"),
    ("upvotes", "upvotes"),
    ("downvotes", "downvotes"),
    ("inReview", "inReview"),
    ("pinned", "pinned"),
    ("emailSent", "emailSent"),
    ("sendNotification", "sendNotification"),
    ("createdAt", "createdAt"),
    ("updatedAt", "updatedAt"),
    ("organization", "organization"),
    ("postId", "submission"),
    ("path", "path"),
];

const CHANGELOG_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("title", "title"),
    ("content", "content"),
    ("markdownContent", "markdownContent"),
    ("featuredImage", "featuredImage"),
    ("date", "date"),
    ("state", "state"),
    ("locale", "locale"),
    ("slug", "slug"),
    ("firstPublishInLocale", "firstPublishInLocale"),
    ("commentCount", "commentCount"),
    ("isPublished", "isPublished"),
    ("availableLocales", "availableLocales"),
    ("publishedLocales", "publishedLocales"),
    ("slugs", "slugs"),
    ("organization", "organization"),
];

const CHANGELOG_CATEGORY_FIELDS: &[(&str, &str)] =
    &[("name", "name"), ("color", "color"), ("id", "id")];

const VOTE_FIELDS: &[(&str, &str)] = &[("action", "action"), ("postId", "submissionId")];

const CHANGE_FIELDS: &[(&str, &str)] = &[
    ("field", "field"),
    ("oldValue", "oldValue"),
    ("newValue", "newValue"),
];

/// Internal message the webhook handler sends to subscription blocks.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SubscriptionMessage {
    pub body: SubscriptionBody,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SubscriptionBody {
    /// Headers of the inbound webhook request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// The webhook envelope as delivered
    pub payload: WebhookEnvelope,
}

/// Delivery metadata shared by every subscription event.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventBase {
    /// The webhook topic, e.g. `post.created`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Unique event ID
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub organization_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub webhook_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub created_at: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub delivery_status: Option<Value>,
}

impl EventBase {
    /// Delivery metadata of `envelope`, or `None` if it belongs to another
    /// topic.
    fn matching(envelope: &WebhookEnvelope, topic: Topic) -> Option<Self> {
        (envelope.topic == topic.as_str()).then(|| Self {
            event_type: topic.as_str().to_string(),
            id: envelope.id.clone(),
            organization_id: envelope.organization_id.clone(),
            webhook_id: envelope.webhook_id.clone(),
            created_at: envelope.created_at.clone(),
            delivery_status: envelope.delivery_status.clone(),
        })
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PostEvent {
    #[serde(flatten)]
    pub base: EventBase,
    #[schemars(with = "EventPost")]
    pub post: Value,
    /// Fields that changed, on `post.updated` only
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Vec<Change>>")]
    pub changes: Option<Vec<Value>>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CommentEvent {
    #[serde(flatten)]
    pub base: EventBase,
    #[schemars(with = "EventComment")]
    pub comment: Value,
    /// Fields that changed, on `comment.updated` only
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<Vec<Change>>")]
    pub changes: Option<Vec<Value>>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ChangelogEvent {
    #[serde(flatten)]
    pub base: EventBase,
    #[schemars(with = "EventChangelog")]
    pub changelog: Value,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct VoteEvent {
    #[serde(flatten)]
    pub base: EventBase,
    #[schemars(with = "EventVote")]
    pub vote: Value,
}

/// Copies the `(output, source)` fields present in `source`. Absent fields
/// are left out; explicit nulls are kept.
fn pick(source: &Value, fields: &[(&str, &str)]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|(to, from)| source.get(*from).map(|v| ((*to).to_string(), v.clone())))
        .collect()
}

fn insert_picked(
    target: &mut Map<String, Value>,
    key: &str,
    source: Option<&Value>,
    fields: &[(&str, &str)],
) {
    if let Some(source) = source {
        target.insert(key.to_string(), Value::Object(pick(source, fields)));
    }
}

fn post_payload(item: &Value) -> Value {
    let mut post = pick(item, POST_FIELDS);
    insert_picked(&mut post, "user", item.get("user"), USER_FIELDS);
    insert_picked(&mut post, "status", item.get("postStatus"), POST_STATUS_FIELDS);
    insert_picked(&mut post, "category", item.get("postCategory"), POST_CATEGORY_FIELDS);
    Value::Object(post)
}

fn comment_payload(item: &Value) -> Value {
    let mut comment = pick(item, COMMENT_FIELDS);
    insert_picked(&mut comment, "user", item.get("user"), USER_FIELDS);
    Value::Object(comment)
}

fn changelog_payload(item: &Value) -> Value {
    let mut changelog = pick(item, CHANGELOG_FIELDS);
    if let Some(categories) = item.get("changelogCategories").and_then(Value::as_array) {
        let categories = categories
            .iter()
            .map(|category| Value::Object(pick(category, CHANGELOG_CATEGORY_FIELDS)))
            .collect();
        changelog.insert("categories".to_string(), Value::Array(categories));
    }
    Value::Object(changelog)
}

fn vote_payload(item: &Value) -> Value {
    let mut vote = pick(item, VOTE_FIELDS);
    insert_picked(&mut vote, "user", item.get("user"), USER_FIELDS);
    Value::Object(vote)
}

fn changes(envelope: &WebhookEnvelope) -> Vec<Value> {
    envelope
        .data
        .changes
        .as_ref()
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|change| Value::Object(pick(change, CHANGE_FIELDS)))
        .collect()
}

fn post_event(message: &SubscriptionMessage, topic: Topic) -> Option<PostEvent> {
    let envelope = &message.body.payload;
    let base = EventBase::matching(envelope, topic)?;
    Some(PostEvent {
        base,
        post: post_payload(&envelope.data.item),
        changes: (topic == Topic::PostUpdated).then(|| changes(envelope)),
    })
}

fn comment_event(message: &SubscriptionMessage, topic: Topic) -> Option<CommentEvent> {
    let envelope = &message.body.payload;
    let base = EventBase::matching(envelope, topic)?;
    Some(CommentEvent {
        base,
        comment: comment_payload(&envelope.data.item),
        changes: (topic == Topic::CommentUpdated).then(|| changes(envelope)),
    })
}

/// # Post Created (ID: postCreatedSubscription)
///
/// Receives events when a new post is created in Featurebase.
///
/// ## Category
/// - Event Subscriptions
///
/// # Errors
///
/// Does not fail. Deliveries for other topics emit nothing.
#[block]
pub async fn post_created_subscription(
    _ctx: Context,
    input: SubscriptionMessage,
) -> Result<Option<PostEvent>> {
    Ok(post_event(&input, Topic::PostCreated))
}

/// # Post Updated (ID: postUpdatedSubscription)
///
/// Receives events when a post is updated in Featurebase.
///
/// The event lists each changed field with its old and new value.
///
/// ## Category
/// - Event Subscriptions
///
/// # Errors
///
/// Does not fail. Deliveries for other topics emit nothing.
#[block]
pub async fn post_updated_subscription(
    _ctx: Context,
    input: SubscriptionMessage,
) -> Result<Option<PostEvent>> {
    Ok(post_event(&input, Topic::PostUpdated))
}

/// # Post Deleted (ID: postDeletedSubscription)
///
/// Receives events when a post is deleted in Featurebase.
///
/// ## Category
/// - Event Subscriptions
///
/// # Errors
///
/// Does not fail. Deliveries for other topics emit nothing.
#[block]
pub async fn post_deleted_subscription(
    _ctx: Context,
    input: SubscriptionMessage,
) -> Result<Option<PostEvent>> {
    Ok(post_event(&input, Topic::PostDeleted))
}

/// # Post Voted (ID: postVotedSubscription)
///
/// Receives events when a post receives a vote (upvote/downvote) in
/// Featurebase.
///
/// ## Category
/// - Event Subscriptions
///
/// # Errors
///
/// Does not fail. Deliveries for other topics emit nothing.
#[block]
pub async fn post_voted_subscription(
    _ctx: Context,
    input: SubscriptionMessage,
) -> Result<Option<VoteEvent>> {
    let envelope = &input.body.payload;
    Ok(
        EventBase::matching(envelope, Topic::PostVoted).map(|base| VoteEvent {
            base,
            vote: vote_payload(&envelope.data.item),
        }),
    )
}

/// # Changelog Published (ID: changelogPublishedSubscription)
///
/// Receives events when a changelog entry is published in Featurebase.
///
/// ## Category
/// - Event Subscriptions
///
/// # Errors
///
/// Does not fail. Deliveries for other topics emit nothing.
#[block]
pub async fn changelog_published_subscription(
    _ctx: Context,
    input: SubscriptionMessage,
) -> Result<Option<ChangelogEvent>> {
    let envelope = &input.body.payload;
    Ok(
        EventBase::matching(envelope, Topic::ChangelogPublished).map(|base| ChangelogEvent {
            base,
            changelog: changelog_payload(&envelope.data.item),
        }),
    )
}

/// # Comment Created (ID: commentCreatedSubscription)
///
/// Receives events when a new comment is created in Featurebase.
///
/// ## Category
/// - Event Subscriptions
///
/// # Errors
///
/// Does not fail. Deliveries for other topics emit nothing.
#[block]
pub async fn comment_created_subscription(
    _ctx: Context,
    input: SubscriptionMessage,
) -> Result<Option<CommentEvent>> {
    Ok(comment_event(&input, Topic::CommentCreated))
}

/// # Comment Updated (ID: commentUpdatedSubscription)
///
/// Receives events when a comment is updated in Featurebase.
///
/// ## Category
/// - Event Subscriptions
///
/// # Errors
///
/// Does not fail. Deliveries for other topics emit nothing.
#[block]
pub async fn comment_updated_subscription(
    _ctx: Context,
    input: SubscriptionMessage,
) -> Result<Option<CommentEvent>> {
    Ok(comment_event(&input, Topic::CommentUpdated))
}

/// # Comment Deleted (ID: commentDeletedSubscription)
///
/// Receives events when a comment is deleted in Featurebase.
///
/// ## Category
/// - Event Subscriptions
///
/// # Errors
///
/// Does not fail. Deliveries for other topics emit nothing.
#[block]
pub async fn comment_deleted_subscription(
    _ctx: Context,
    input: SubscriptionMessage,
) -> Result<Option<CommentEvent>> {
    Ok(comment_event(&input, Topic::CommentDeleted))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use flowblocks::InMemoryHost;
    use serde_json::json;

    use super::*;
    use crate::{
        security::compute_signature,
        webhook::{WebhookRequest, handle_webhook},
    };

    fn message(envelope: Value) -> SubscriptionMessage {
        serde_json::from_value(json!({
            "body": {"headers": {}, "payload": envelope}
        }))
        .unwrap()
    }

    fn user() -> Value {
        json!({
            "id": "u1",
            "email": "ada@example.test",
            "name": "Ada",
            "profilePicture": null,
            "verified": true,
            "type": "customer",
            "commentsCreated": 4
        })
    }

    fn post_envelope(topic: &str) -> Value {
        json!({
            "type": "notification",
            "topic": topic,
            "organizationId": "org_1",
            "data": {
                "item": {
                    "type": "post",
                    "id": "p1",
                    "title": "Dark mode",
                    "upvotes": 3,
                    "user": user(),
                    "postStatus": {"name": "In Review", "color": "Blue", "type": "reviewing", "isDefault": true, "id": "st1"},
                    "postCategory": {"category": "Ideas", "private": false, "icon": null, "id": "b1", "roles": []}
                },
                "changes": [{"field": "title", "oldValue": "Dark", "newValue": "Dark mode", "extra": 1}]
            },
            "id": "evt_1",
            "webhookId": "wh_1",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "deliveryStatus": "pending"
        })
    }

    #[tokio::test]
    async fn test_post_updated_reshapes_item_and_changes() {
        // Arrange
        let input = message(post_envelope("post.updated"));

        // Act
        let event = post_updated_subscription(Context::empty(), input)
            .await
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "post.updated",
                "id": "evt_1",
                "organizationId": "org_1",
                "webhookId": "wh_1",
                "createdAt": "2024-01-01T00:00:00.000Z",
                "deliveryStatus": "pending",
                "post": {
                    "id": "p1",
                    "title": "Dark mode",
                    "upvotes": 3,
                    "user": {
                        "id": "u1",
                        "email": "ada@example.test",
                        "name": "Ada",
                        "profilePicture": null,
                        "verified": true,
                        "type": "customer"
                    },
                    "status": {"name": "In Review", "color": "Blue", "type": "reviewing", "isDefault": true, "id": "st1"},
                    "category": {"name": "Ideas", "private": false, "icon": null, "id": "b1"}
                },
                "changes": [{"field": "title", "oldValue": "Dark", "newValue": "Dark mode"}]
            })
        );
    }

    #[tokio::test]
    async fn test_post_created_omits_changes() {
        let input = message(post_envelope("post.created"));

        let event = post_created_subscription(Context::empty(), input)
            .await
            .unwrap()
            .unwrap();

        assert!(event.changes.is_none());
        assert_eq!(event.base.event_type, "post.created");
    }

    #[tokio::test]
    async fn test_subscription_ignores_other_topics() {
        let input = message(post_envelope("post.created"));

        let event = post_deleted_subscription(Context::empty(), input)
            .await
            .unwrap();

        assert!(event.is_none());
    }

    #[tokio::test]
    async fn test_comment_updated_maps_submission_to_post_id() {
        // Arrange
        let input = message(json!({
            "topic": "comment.updated",
            "data": {
                "item": {"type": "comment", "id": "c1", "content": "Nice", "submission": "p1", "user": user()}
            },
            "id": "evt_2"
        }));

        // Act
        let event = comment_updated_subscription(Context::empty(), input)
            .await
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(event.comment["postId"], "p1");
        assert_eq!(event.comment["user"]["name"], "Ada");
        assert_eq!(event.changes, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_changelog_published_maps_categories() {
        let input = message(json!({
            "topic": "changelog.published",
            "data": {
                "item": {
                    "type": "changelog",
                    "id": "cl1",
                    "title": "Release 1",
                    "slugs": {"en": "release-1"},
                    "changelogCategories": [{"name": "New", "color": "Green", "id": "cc1", "roles": []}]
                }
            }
        }));

        let event = changelog_published_subscription(Context::empty(), input)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            event.changelog["categories"],
            json!([{"name": "New", "color": "Green", "id": "cc1"}])
        );
        assert_eq!(event.changelog["slugs"]["en"], "release-1");
    }

    #[tokio::test]
    async fn test_post_voted_maps_submission_id() {
        let input = message(json!({
            "topic": "post.voted",
            "data": {
                "item": {"type": "post_vote", "action": "add", "submissionId": "p1", "user": user()}
            }
        }));

        let event = post_voted_subscription(Context::empty(), input)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(event.vote["action"], "add");
        assert_eq!(event.vote["postId"], "p1");
    }

    #[test]
    fn test_every_topic_has_a_registered_subscription_block() {
        for topic in Topic::ALL {
            let entry = flowblocks::find_block(topic.block_type_id())
                .unwrap_or_else(|| panic!("no block for {topic}"));
            assert_eq!(entry.category, "Event Subscriptions");
        }
    }

    #[tokio::test]
    async fn test_signed_delivery_reaches_subscription_block() {
        // Arrange
        let mut subscriptions = HashMap::new();
        subscriptions.insert(
            "postCreatedSubscription".to_string(),
            vec!["block-1".to_string()],
        );
        let host = InMemoryHost::new(subscriptions).recording();
        let body = post_envelope("post.created").to_string();
        let timestamp = Utc::now().timestamp().to_string();
        let signature = compute_signature("whsec_test", &timestamp, &body).unwrap();
        let request = WebhookRequest {
            method: "POST".to_string(),
            path: "/".to_string(),
            headers: BTreeMap::from([
                ("X-Webhook-Signature".to_string(), signature),
                ("X-Webhook-Timestamp".to_string(), timestamp),
            ]),
            body,
        };

        // Act
        let response = handle_webhook(&request, Some("whsec_test"), &host).await;

        // Assert
        assert_eq!(response.status, 200);
        assert_eq!(response.body["blocksNotified"], 1);
        let deliveries = host.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].block_id, "block-1");
        let output = deliveries[0].output.as_ref().unwrap();
        assert_eq!(output["type"], "post.created");
        assert_eq!(output["post"]["category"]["name"], "Ideas");
    }

    #[tokio::test]
    async fn test_instance_subscribed_to_two_topics_gets_matching_event() {
        // Arrange
        let mut subscriptions = HashMap::new();
        for block_type_id in ["postCreatedSubscription", "postUpdatedSubscription"] {
            subscriptions.insert(block_type_id.to_string(), vec!["notify".to_string()]);
        }
        let host = InMemoryHost::new(subscriptions).recording();
        let body = post_envelope("post.updated").to_string();
        let timestamp = Utc::now().timestamp().to_string();
        let signature = compute_signature("whsec_test", &timestamp, &body).unwrap();
        let request = WebhookRequest {
            method: "POST".to_string(),
            path: "/".to_string(),
            headers: BTreeMap::from([
                ("X-Webhook-Signature".to_string(), signature),
                ("X-Webhook-Timestamp".to_string(), timestamp),
            ]),
            body,
        };

        // Act
        let response = handle_webhook(&request, Some("whsec_test"), &host).await;

        // Assert
        assert_eq!(response.status, 200);
        let deliveries = host.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].block_type_id, "postUpdatedSubscription");
        assert_eq!(
            deliveries[0].output.as_ref().unwrap()["type"],
            "post.updated"
        );
    }
}
