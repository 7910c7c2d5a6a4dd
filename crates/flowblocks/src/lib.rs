//! # Flowblocks Block SDK
//!
//! Connectors expose remote services to a workflow-automation host as a
//! catalog of blocks. A block is an async function with a typed input and a
//! typed output, registered with the `#[block]` attribute:
//!
//! ```ignore
//! /// # Get board by ID (ID: getBoard)
//! ///
//! /// Retrieve a specific board by its unique identifier.
//! ///
//! /// ## Category
//! /// - Boards
//! #[block]
//! async fn get_board(ctx: Context, input: GetBoardInput) -> Result<serde_json::Value> {
//!     // ...
//! }
//! ```
//!
//! Blocks are collected into a process-wide registry at link time, so a
//! host only has to depend on the connector crate to see its blocks. Use
//! [`blocks`], [`find_block`] and [`invoke`] to enumerate and run them.
//!
//! ## App Configuration
//!
//! Settings the host stores for a connector (API keys, base URLs, webhook
//! secrets) are declared once with `define_app_config!` and read from the
//! [`Context`] on every invocation:
//!
//! ```ignore
//! define_app_config!(FeaturebaseConfig("featurebase") {
//!     /// Featurebase API key
//!     #[sensitive]
//!     api_key: String,
//! });
//!
//! let config = FeaturebaseConfig::get(&ctx)?;
//! ```
//!
//! ## Lifecycle Hooks
//!
//! `#[init]` functions run before the host starts dispatching and
//! `#[shutdown]` functions run when it stops.
//!
//! ## Host Seam
//!
//! Inter-block messaging is delegated to a [`BlockHost`]. The bundled
//! [`InMemoryHost`] routes messages to registered blocks in-process.

// Allow proc-macro expansions within this crate to refer to it via `::flowblocks`.
extern crate self as flowblocks;

mod app_config;
pub mod config;
mod context;
mod entrypoint;
mod host;

pub use anyhow::{self, Result, bail, ensure};
pub use app_config::{AppConfigError, app_config_fields};
pub use async_trait::async_trait;
pub use context::Context;
pub use entrypoint::{
    BlockEntry, InvokeError, blocks, find_block, invoke, run_init_hooks, run_shutdown_hooks,
};
pub use flowblocks_macro::{block, define_app_config, init, shutdown};
pub use host::{BlockHost, Delivery, InMemoryHost};
// Full schemars re-export required because JsonSchema derive macro generates
// code referencing `schemars::*` paths directly.
pub use schemars;
pub use schemars::JsonSchema;
pub use tracing::{Level, debug, error, info, span, trace, warn};

#[doc(hidden)]
pub mod __private {
    pub use anyhow;
    pub use inventory;
    pub use schemars;
    pub use serde;
    pub use serde_json;

    pub use crate::{
        app_config::{AppConfigEntry, AppConfigFieldSchema},
        context::Context,
        entrypoint::{BlockEntry, InitEntry, Sealed, ShutdownEntry},
    };

    #[inline]
    #[must_use]
    pub const fn sealed() -> Sealed {
        Sealed(())
    }
}
