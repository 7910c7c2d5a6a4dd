//! Host seam for inter-block messaging.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use anyhow::Context as _;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::{Context, entrypoint::invoke};

/// The parts of the workflow host a connector talks back to.
#[async_trait]
pub trait BlockHost: Send + Sync {
    /// Returns the ids of block instances currently subscribed to a block type.
    async fn list_subscribers(&self, block_type_id: &str) -> anyhow::Result<Vec<String>>;

    /// Delivers one internal message to each of the given block instances.
    async fn send_to_blocks(&self, message: Value, block_ids: &[String]) -> anyhow::Result<()>;
}

/// A delivered message and what the receiving block emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub block_id: String,
    pub block_type_id: String,
    /// `None` when the block chose not to emit.
    pub output: Option<Value>,
}

/// Separates the block type from the instance id in the subscriber ids
/// handed out by [`InMemoryHost`].
const TYPE_SEPARATOR: char = '/';

/// In-process host that routes messages to blocks in the local registry.
///
/// Subscriptions are a static table of block type id to block instance ids.
/// One instance id may appear under several block types, so the subscriber
/// ids returned by [`BlockHost::list_subscribers`] are qualified as
/// `<blockTypeId>/<instanceId>` and routed back to the same block type.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    subscriptions: HashMap<String, Vec<String>>,
    app_config: HashMap<String, String>,
    deliveries: Option<Mutex<Vec<Delivery>>>,
}

impl InMemoryHost {
    #[must_use]
    pub fn new(subscriptions: HashMap<String, Vec<String>>) -> Self {
        Self {
            subscriptions,
            ..Self::default()
        }
    }

    /// App configuration handed to every block this host invokes.
    #[must_use]
    pub fn with_app_config(mut self, values: HashMap<String, String>) -> Self {
        self.app_config = values;
        self
    }

    /// Keeps every delivery for [`deliveries`](Self::deliveries).
    #[must_use]
    pub fn recording(mut self) -> Self {
        self.deliveries = Some(Mutex::default());
        self
    }

    /// Returns a snapshot of every delivery made so far. Always empty unless
    /// the host was built with [`recording`](Self::recording).
    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.as_ref().map_or_else(Vec::new, |deliveries| {
            deliveries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        })
    }

    /// Splits a qualified subscriber id into its block type and instance id.
    fn resolve<'a>(&self, subscriber_id: &'a str) -> Option<(&'a str, &'a str)> {
        let (block_type_id, block_id) = subscriber_id.split_once(TYPE_SEPARATOR)?;
        self.subscriptions
            .get(block_type_id)
            .is_some_and(|ids| ids.iter().any(|id| id == block_id))
            .then_some((block_type_id, block_id))
    }
}

#[async_trait]
impl BlockHost for InMemoryHost {
    async fn list_subscribers(&self, block_type_id: &str) -> anyhow::Result<Vec<String>> {
        Ok(self
            .subscriptions
            .get(block_type_id)
            .into_iter()
            .flatten()
            .map(|block_id| format!("{block_type_id}{TYPE_SEPARATOR}{block_id}"))
            .collect())
    }

    async fn send_to_blocks(&self, message: Value, block_ids: &[String]) -> anyhow::Result<()> {
        for subscriber_id in block_ids {
            let (block_type_id, block_id) = self
                .resolve(subscriber_id)
                .with_context(|| format!("block instance '{subscriber_id}' has no subscription"))?;

            let ctx = Context::new(block_id).with_app_config(self.app_config.clone());
            let output = invoke(block_type_id, ctx, message.clone()).await?;
            let output = (!output.is_null()).then_some(output);

            if output.is_some() {
                info!(block_id = %block_id, block_type = %block_type_id, "Block emitted event");
            } else {
                debug!(block_id = %block_id, block_type = %block_type_id, "Block emitted nothing");
            }

            if let Some(deliveries) = &self.deliveries {
                deliveries
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(Delivery {
                        block_id: block_id.to_string(),
                        block_type_id: block_type_id.to_string(),
                        output,
                    });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{future::Future, pin::Pin};

    use serde_json::json;

    use super::*;
    use crate::entrypoint::{BlockEntry, Sealed};

    const TEST_SUBSCRIPTION_ID: &str = "flowblocks.test.subscription";
    const OTHER_SUBSCRIPTION_ID: &str = "flowblocks.test.otherSubscription";

    fn subscription_handler(
        ctx: Context,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send + 'static>> {
        Box::pin(async move {
            if input["payload"]["topic"] == "ignored" {
                return Ok(Value::Null);
            }
            Ok(json!({
                "receivedBy": ctx.request_id(),
                "secret": ctx.app_value("webhookSecret"),
            }))
        })
    }

    fn other_handler(
        ctx: Context,
        _input: Value,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send + 'static>> {
        Box::pin(async move { Ok(json!({"otherReceivedBy": ctx.request_id()})) })
    }

    inventory::submit! {
        BlockEntry {
            id: TEST_SUBSCRIPTION_ID,
            name: "Test subscription",
            description: "Receives host messages",
            category: "Testing",
            input_schema_fn: || json!({"type": "object"}),
            output_schema_fn: || json!({"type": "object"}),
            handler: subscription_handler,
            __sealed: Sealed(()),
        }
    }

    inventory::submit! {
        BlockEntry {
            id: OTHER_SUBSCRIPTION_ID,
            name: "Other test subscription",
            description: "Receives host messages for another type",
            category: "Testing",
            input_schema_fn: || json!({"type": "object"}),
            output_schema_fn: || json!({"type": "object"}),
            handler: other_handler,
            __sealed: Sealed(()),
        }
    }

    fn host() -> InMemoryHost {
        let mut subscriptions = HashMap::new();
        subscriptions.insert(
            TEST_SUBSCRIPTION_ID.to_string(),
            vec!["instance-a".to_string(), "instance-b".to_string()],
        );
        InMemoryHost::new(subscriptions).recording()
    }

    #[tokio::test]
    async fn test_list_subscribers_qualifies_instances_with_block_type() {
        let host = host();

        let subscribers = host.list_subscribers(TEST_SUBSCRIPTION_ID).await.unwrap();

        assert_eq!(
            subscribers,
            vec![
                format!("{TEST_SUBSCRIPTION_ID}/instance-a"),
                format!("{TEST_SUBSCRIPTION_ID}/instance-b"),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_subscribers_for_unknown_type_is_empty() {
        let host = host();

        let subscribers = host.list_subscribers("nothingSubscribed").await.unwrap();

        assert!(subscribers.is_empty());
    }

    #[tokio::test]
    async fn test_send_to_blocks_invokes_each_instance_with_app_config() {
        // Arrange
        let mut app_config = HashMap::new();
        app_config.insert("webhookSecret".to_string(), "whsec".to_string());
        let host = host().with_app_config(app_config);
        let ids = host.list_subscribers(TEST_SUBSCRIPTION_ID).await.unwrap();

        // Act
        host.send_to_blocks(json!({"payload": {"topic": "post.created"}}), &ids)
            .await
            .unwrap();

        // Assert
        let deliveries = host.deliveries();
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].block_id, "instance-a");
        assert_eq!(deliveries[0].block_type_id, TEST_SUBSCRIPTION_ID);
        assert_eq!(
            deliveries[1].output,
            Some(json!({"receivedBy": "instance-b", "secret": "whsec"}))
        );
    }

    #[tokio::test]
    async fn test_shared_instance_is_routed_to_the_listed_block_type() {
        // Arrange
        let mut subscriptions = HashMap::new();
        for block_type_id in [TEST_SUBSCRIPTION_ID, OTHER_SUBSCRIPTION_ID] {
            subscriptions.insert(block_type_id.to_string(), vec!["shared".to_string()]);
        }
        let host = InMemoryHost::new(subscriptions).recording();

        // Act
        let ids = host.list_subscribers(OTHER_SUBSCRIPTION_ID).await.unwrap();
        host.send_to_blocks(json!({}), &ids).await.unwrap();

        // Assert
        assert_eq!(
            host.deliveries(),
            vec![Delivery {
                block_id: "shared".to_string(),
                block_type_id: OTHER_SUBSCRIPTION_ID.to_string(),
                output: Some(json!({"otherReceivedBy": "shared"})),
            }]
        );
    }

    #[tokio::test]
    async fn test_send_to_blocks_records_blocks_that_emit_nothing() {
        let host = host();

        host.send_to_blocks(
            json!({"payload": {"topic": "ignored"}}),
            &[format!("{TEST_SUBSCRIPTION_ID}/instance-a")],
        )
        .await
        .unwrap();

        assert_eq!(host.deliveries()[0].output, None);
    }

    #[tokio::test]
    async fn test_deliveries_are_not_kept_unless_recording() {
        let mut subscriptions = HashMap::new();
        subscriptions.insert(
            TEST_SUBSCRIPTION_ID.to_string(),
            vec!["instance-a".to_string()],
        );
        let host = InMemoryHost::new(subscriptions);
        let ids = host.list_subscribers(TEST_SUBSCRIPTION_ID).await.unwrap();

        host.send_to_blocks(json!({}), &ids).await.unwrap();

        assert!(host.deliveries().is_empty());
    }

    #[tokio::test]
    async fn test_send_to_blocks_rejects_unknown_instance() {
        let host = host();

        for id in [
            "stranger".to_string(),
            format!("{TEST_SUBSCRIPTION_ID}/stranger"),
            format!("{OTHER_SUBSCRIPTION_ID}/instance-a"),
        ] {
            let err = host
                .send_to_blocks(json!({}), std::slice::from_ref(&id))
                .await
                .expect_err("unknown instance should fail");

            assert_eq!(
                err.to_string(),
                format!("block instance '{id}' has no subscription")
            );
        }
    }
}
