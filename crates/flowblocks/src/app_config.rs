//! App configuration surface and registration.

use serde::Serialize;

use crate::entrypoint::Sealed;

/// Errors that can occur when reading app configuration from a [`Context`].
///
/// [`Context`]: crate::Context
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppConfigError {
    /// The host did not supply any app configuration.
    #[error("app configuration not provided")]
    Missing,

    /// The supplied values could not be deserialized into the config type.
    #[error("invalid app configuration: {0}")]
    Invalid(String),
}

/// Schema for a single app configuration field.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfigFieldSchema {
    pub description: &'static str,
    pub required: bool,
    /// Sensitive values are masked by the host and never logged.
    pub sensitive: bool,
}

/// Registry entry for an app configuration definition.
///
/// Only `define_app_config!` can construct this because it requires a
/// [`Sealed`] token.
#[derive(Debug)]
pub struct AppConfigEntry {
    /// Connector the settings belong to (e.g. "featurebase").
    pub name: &'static str,
    /// Host-facing keys in declaration order.
    pub fields: &'static [(&'static str, AppConfigFieldSchema)],
    #[doc(hidden)]
    pub __sealed: Sealed,
}

impl Serialize for AppConfigEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::{SerializeMap, SerializeStruct};

        /// Serializes the field slice as a map without allocating.
        struct FieldsMap<'a>(&'a [(&'static str, AppConfigFieldSchema)]);

        impl Serialize for FieldsMap<'_> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (key, value) in self.0 {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }

        let mut state = serializer.serialize_struct("AppConfigEntry", 2)?;
        state.serialize_field("name", self.name)?;
        state.serialize_field("fields", &FieldsMap(self.fields))?;
        state.end()
    }
}

inventory::collect!(AppConfigEntry);

/// Returns every registered app configuration definition.
pub fn app_config_fields() -> impl Iterator<Item = &'static AppConfigEntry> {
    inventory::iter::<AppConfigEntry>()
}
