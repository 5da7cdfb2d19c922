//! Traversal limits and the provider that resolves them.
//!
//! Effective limits are the built-in defaults overlaid with whatever the user
//! persisted under [`LIMITS_STORAGE_KEY`]. Every field is resolved on its own,
//! so a store holding only `maxDepth` still yields the default node and string
//! limits.

use crate::settings::SettingsStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default maximum element depth below the root
pub const DEFAULT_MAX_DEPTH: usize = 50;
/// Default maximum number of captured elements
pub const DEFAULT_MAX_NODES: usize = 10_000;
/// Default maximum length of captured own-text, in characters
pub const DEFAULT_MAX_STRING_LENGTH: usize = 1_000;

/// Settings key the limits are persisted under
pub const LIMITS_STORAGE_KEY: &str = "websketch_limits";

/// Bounds applied to a single capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    pub max_depth: usize,
    pub max_nodes: usize,
    pub max_string_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
            max_string_length: DEFAULT_MAX_STRING_LENGTH,
        }
    }
}

impl Limits {
    /// Reject zero values
    pub fn validate(&self) -> Result<()> {
        PartialLimits::from(*self).validate()
    }

    /// Overwrite the fields present in `partial`
    pub fn merge(self, partial: &PartialLimits) -> Limits {
        Limits {
            max_depth: partial.max_depth.unwrap_or(self.max_depth),
            max_nodes: partial.max_nodes.unwrap_or(self.max_nodes),
            max_string_length: partial.max_string_length.unwrap_or(self.max_string_length),
        }
    }
}

/// A partial limits record, as stored and as accepted by [`LimitsProvider::persist`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_nodes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_string_length: Option<usize>,
}

impl PartialLimits {
    pub fn with_max_depth(mut self, value: usize) -> Self {
        self.max_depth = Some(value);
        self
    }

    pub fn with_max_nodes(mut self, value: usize) -> Self {
        self.max_nodes = Some(value);
        self
    }

    pub fn with_max_string_length(mut self, value: usize) -> Self {
        self.max_string_length = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.max_depth.is_none() && self.max_nodes.is_none() && self.max_string_length.is_none()
    }

    /// Reject fields that are present but zero
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("maxDepth", self.max_depth),
            ("maxNodes", self.max_nodes),
            ("maxStringLength", self.max_string_length),
        ];
        for (name, value) in fields {
            if value == Some(0) {
                return Err(Error::InvalidLimits(format!("{} must be a positive integer", name)));
            }
        }
        Ok(())
    }

    /// Build a complete record from free-text form input.
    ///
    /// Blank, non-numeric and non-positive entries fall back to the default
    /// for that field, so the result always passes [`PartialLimits::validate`].
    pub fn from_inputs(max_depth: &str, max_nodes: &str, max_string_length: &str) -> Self {
        fn positive_or(input: &str, default: usize) -> usize {
            match input.trim().parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => default,
            }
        }
        Self {
            max_depth: Some(positive_or(max_depth, DEFAULT_MAX_DEPTH)),
            max_nodes: Some(positive_or(max_nodes, DEFAULT_MAX_NODES)),
            max_string_length: Some(positive_or(max_string_length, DEFAULT_MAX_STRING_LENGTH)),
        }
    }
}

impl From<Limits> for PartialLimits {
    fn from(limits: Limits) -> Self {
        Self {
            max_depth: Some(limits.max_depth),
            max_nodes: Some(limits.max_nodes),
            max_string_length: Some(limits.max_string_length),
        }
    }
}

/// Anything that can produce the limits for the next capture
pub trait LimitsSource: Send + Sync {
    fn resolve(&self) -> Result<Limits>;
}

impl LimitsSource for Limits {
    fn resolve(&self) -> Result<Limits> {
        Ok(*self)
    }
}

/// Resolves limits from defaults plus persisted user overrides
#[derive(Debug)]
pub struct LimitsProvider<S> {
    store: S,
}

impl<S: SettingsStore> LimitsProvider<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying settings store
    pub fn store(&self) -> &S {
        &self.store
    }

    fn stored(&self) -> Result<PartialLimits> {
        match self.store.get(LIMITS_STORAGE_KEY)? {
            None | Some(serde_json::Value::Null) => Ok(PartialLimits::default()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                Error::StorageError(format!("Malformed value under '{}': {}", LIMITS_STORAGE_KEY, e))
            }),
        }
    }

    /// Effective limits: each persisted field, else its default.
    ///
    /// Storage failures are returned, never papered over with defaults.
    pub fn resolve(&self) -> Result<Limits> {
        let stored = self.stored()?;
        stored.validate()?;
        Ok(Limits::default().merge(&stored))
    }

    /// Merge `partial` into the persisted limits and return the new record.
    ///
    /// Fields absent from `partial` keep their previously persisted values.
    pub fn persist(&self, partial: &PartialLimits) -> Result<Limits> {
        partial.validate()?;
        let merged = self.resolve()?.merge(partial);
        self.store.set(LIMITS_STORAGE_KEY, serde_json::to_value(merged)?)?;
        log::debug!("Persisted limits {:?}", merged);
        Ok(merged)
    }

    /// Persist the defaults for every field.
    ///
    /// Does not read the current value, so it also recovers a store holding a
    /// malformed record.
    pub fn reset(&self) -> Result<Limits> {
        let defaults = Limits::default();
        self.store.set(LIMITS_STORAGE_KEY, serde_json::to_value(defaults)?)?;
        log::debug!("Reset limits to defaults");
        Ok(defaults)
    }
}

impl<S: SettingsStore> LimitsSource for LimitsProvider<S> {
    fn resolve(&self) -> Result<Limits> {
        LimitsProvider::resolve(self)
    }
}

/// One-off overrides layered over another source without persisting them
#[derive(Debug)]
pub struct WithOverrides<L> {
    inner: L,
    overrides: PartialLimits,
}

impl<L: LimitsSource> WithOverrides<L> {
    pub fn new(inner: L, overrides: PartialLimits) -> Self {
        Self { inner, overrides }
    }
}

impl<L: LimitsSource> LimitsSource for WithOverrides<L> {
    fn resolve(&self) -> Result<Limits> {
        self.overrides.validate()?;
        Ok(self.inner.resolve()?.merge(&self.overrides))
    }
}
