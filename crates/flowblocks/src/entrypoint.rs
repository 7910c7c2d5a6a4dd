//! Block registration and discovery.
//!
//! Connectors register their blocks, init handlers, and shutdown handlers
//! through static entries collected into global inventories at link time.
//!
//! # Entry Types
//!
//! - [`BlockEntry`] - A block with its metadata, schema functions, and async handler
//! - [`InitEntry`] - An initialization handler run before dispatching starts
//! - [`ShutdownEntry`] - A cleanup handler run when the host stops
//!
//! # Sealed Pattern
//!
//! All entry types include a `__sealed: Sealed` field so that entries are
//! only created through the procedural macros in `flowblocks-macro`, which
//! validate the handler signature and metadata.

use std::{future::Future, pin::Pin};

use serde_json::Value;
use tracing::{debug, info};

use crate::Context;

/// Async handler function for a block invocation.
///
/// Receives the invocation context and the input as JSON, and returns the
/// output as JSON.
pub type BlockHandlerFn =
    fn(Context, Value) -> Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send + 'static>>;

/// Async initialization handler function.
pub type InitFn = fn() -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// Synchronous shutdown handler function.
pub type ShutdownFn = fn();

/// Marker type to prevent direct construction of entry types.
#[doc(hidden)]
#[derive(Debug, Clone, Copy)]
pub struct Sealed(pub(crate) ());

/// Registration entry for a block.
///
/// Entries are created by the `#[block]` procedural macro and submitted to
/// the global inventory via `inventory::submit!`.
#[derive(Debug)]
pub struct BlockEntry {
    /// Block type id (e.g. "createPost")
    pub id: &'static str,
    /// Human-readable display name
    pub name: &'static str,
    /// What the block does
    pub description: &'static str,
    /// Catalog category (e.g. "Posts")
    pub category: &'static str,
    /// Returns the JSON Schema for this block's input
    pub input_schema_fn: fn() -> Value,
    /// Returns the JSON Schema for this block's output
    pub output_schema_fn: fn() -> Value,
    /// Async handler called when the block is invoked
    pub handler: BlockHandlerFn,
    #[doc(hidden)]
    pub __sealed: Sealed,
}

inventory::collect!(BlockEntry);

/// Registration entry for an initialization handler.
///
/// Init handlers are called in the order they were submitted to the inventory.
#[derive(Debug)]
pub struct InitEntry {
    /// Identifier for this init handler
    pub name: &'static str,
    /// Async initialization function
    pub handler: InitFn,
    #[doc(hidden)]
    pub __sealed: Sealed,
}

inventory::collect!(InitEntry);

/// Registration entry for a shutdown handler.
#[derive(Debug)]
pub struct ShutdownEntry {
    /// Identifier for this shutdown handler
    pub name: &'static str,
    /// Synchronous cleanup function
    pub handler: ShutdownFn,
    #[doc(hidden)]
    pub __sealed: Sealed,
}

inventory::collect!(ShutdownEntry);

/// Errors returned by [`invoke`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum InvokeError {
    /// No block with the requested id is registered.
    #[error("block '{0}' not found")]
    NotFound(String),

    /// The block handler returned an error.
    #[error("block '{id}' failed: {source:#}")]
    Failed {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Returns every registered block.
pub fn blocks() -> impl Iterator<Item = &'static BlockEntry> {
    inventory::iter::<BlockEntry>()
}

/// Looks up a registered block by id.
#[must_use]
pub fn find_block(id: &str) -> Option<&'static BlockEntry> {
    blocks().find(|entry| entry.id == id)
}

/// Runs the block `id` with a JSON input and returns its JSON output.
///
/// # Errors
///
/// Returns [`InvokeError::NotFound`] for an unknown id, or
/// [`InvokeError::Failed`] when the handler (or input deserialization)
/// fails.
pub async fn invoke(id: &str, ctx: Context, input: Value) -> Result<Value, InvokeError> {
    let entry = find_block(id).ok_or_else(|| InvokeError::NotFound(id.to_string()))?;
    debug!(block = entry.id, request_id = ctx.request_id(), "Invoking block");

    (entry.handler)(ctx, input)
        .await
        .map_err(|source| InvokeError::Failed {
            id: id.to_string(),
            source,
        })
}

/// Runs every registered init hook, stopping at the first failure.
///
/// # Errors
///
/// Returns the first init hook error, annotated with the hook name.
pub async fn run_init_hooks() -> anyhow::Result<()> {
    for entry in inventory::iter::<InitEntry>() {
        debug!(hook = entry.name, "Running init hook");
        (entry.handler)()
            .await
            .map_err(|e| e.context(format!("init hook '{}' failed", entry.name)))?;
    }
    info!("Init hooks complete");
    Ok(())
}

/// Runs every registered shutdown hook.
pub fn run_shutdown_hooks() {
    for entry in inventory::iter::<ShutdownEntry>() {
        debug!(hook = entry.name, "Running shutdown hook");
        (entry.handler)();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    const TEST_BLOCK_ID: &str = "flowblocks.test.echo";
    const TEST_FAILING_BLOCK_ID: &str = "flowblocks.test.failing";
    const TEST_INIT_NAME: &str = "flowblocks.test.init";
    const TEST_SHUTDOWN_NAME: &str = "flowblocks.test.shutdown";

    static INIT_CALLS: AtomicUsize = AtomicUsize::new(0);
    static SHUTDOWN_CALLED: AtomicBool = AtomicBool::new(false);

    fn echo_handler(
        ctx: Context,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send + 'static>> {
        Box::pin(async move {
            Ok(json!({
                "requestId": ctx.request_id(),
                "input": input,
            }))
        })
    }

    fn failing_handler(
        _ctx: Context,
        _input: Value,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send + 'static>> {
        Box::pin(async { Err(anyhow::anyhow!("upstream exploded")) })
    }

    fn test_init_handler() -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>> {
        Box::pin(async {
            INIT_CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn test_shutdown_handler() {
        SHUTDOWN_CALLED.store(true, Ordering::SeqCst);
    }

    inventory::submit! {
        BlockEntry {
            id: TEST_BLOCK_ID,
            name: "Echo",
            description: "Echoes its input",
            category: "Testing",
            input_schema_fn: || json!({"type": "object"}),
            output_schema_fn: || json!({"type": "object"}),
            handler: echo_handler,
            __sealed: Sealed(()),
        }
    }

    inventory::submit! {
        BlockEntry {
            id: TEST_FAILING_BLOCK_ID,
            name: "Failing",
            description: "Always fails",
            category: "Testing",
            input_schema_fn: || json!({"type": "object"}),
            output_schema_fn: || json!({"type": "null"}),
            handler: failing_handler,
            __sealed: Sealed(()),
        }
    }

    inventory::submit! {
        InitEntry {
            name: TEST_INIT_NAME,
            handler: test_init_handler,
            __sealed: Sealed(()),
        }
    }

    inventory::submit! {
        ShutdownEntry {
            name: TEST_SHUTDOWN_NAME,
            handler: test_shutdown_handler,
            __sealed: Sealed(()),
        }
    }

    #[test]
    fn test_find_block_returns_registered_entry() {
        // Arrange & Act
        let entry = find_block(TEST_BLOCK_ID).expect("test block must be registered");

        // Assert
        assert_eq!(entry.name, "Echo");
        assert_eq!(entry.category, "Testing");
        assert_eq!((entry.input_schema_fn)()["type"], "object");
        assert!(find_block("flowblocks.test.missing").is_none());
    }

    #[test]
    fn test_blocks_lists_all_registered_entries() {
        let ids: Vec<_> = blocks().map(|entry| entry.id).collect();

        assert!(ids.contains(&TEST_BLOCK_ID));
        assert!(ids.contains(&TEST_FAILING_BLOCK_ID));
    }

    #[tokio::test]
    async fn test_invoke_passes_context_and_input_to_handler() {
        // Arrange
        let ctx = Context::new("req-123");

        // Act
        let output = invoke(TEST_BLOCK_ID, ctx, json!({"title": "Hi"}))
            .await
            .expect("invoke should succeed");

        // Assert
        assert_eq!(
            output,
            json!({"requestId": "req-123", "input": {"title": "Hi"}})
        );
    }

    #[tokio::test]
    async fn test_invoke_unknown_block_returns_not_found() {
        let err = invoke("flowblocks.test.missing", Context::empty(), json!({}))
            .await
            .expect_err("unknown block should fail");

        assert!(matches!(err, InvokeError::NotFound(ref id) if id == "flowblocks.test.missing"));
        assert_eq!(err.to_string(), "block 'flowblocks.test.missing' not found");
    }

    #[tokio::test]
    async fn test_invoke_wraps_handler_errors() {
        // Arrange & Act
        let err = invoke(TEST_FAILING_BLOCK_ID, Context::empty(), json!({}))
            .await
            .expect_err("failing block should fail");

        // Assert
        assert_eq!(
            err.to_string(),
            "block 'flowblocks.test.failing' failed: upstream exploded"
        );
    }

    #[tokio::test]
    async fn test_block_handler_is_send_and_can_be_spawned() {
        let entry = find_block(TEST_BLOCK_ID).expect("test block must be registered");

        let handle = tokio::spawn((entry.handler)(Context::empty(), json!(null)));

        assert!(handle.await.expect("task should join").is_ok());
    }

    #[tokio::test]
    async fn test_run_init_hooks_calls_registered_hooks() {
        // Arrange
        let before = INIT_CALLS.load(Ordering::SeqCst);

        // Act
        run_init_hooks().await.expect("init hooks should succeed");

        // Assert
        assert!(INIT_CALLS.load(Ordering::SeqCst) > before);
    }

    #[test]
    fn test_run_shutdown_hooks_calls_registered_hooks() {
        SHUTDOWN_CALLED.store(false, Ordering::SeqCst);

        run_shutdown_hooks();

        assert!(SHUTDOWN_CALLED.load(Ordering::SeqCst));
    }

    #[test]
    fn test_entry_types_implement_debug() {
        let block = find_block(TEST_BLOCK_ID).expect("test block must be registered");
        let init = inventory::iter::<InitEntry>()
            .find(|entry| entry.name == TEST_INIT_NAME)
            .expect("test init entry must be registered");

        assert!(format!("{block:?}").contains(TEST_BLOCK_ID));
        assert!(format!("{init:?}").contains("InitEntry"));
    }
}
