//! BD-001: Identity types shared by blueprints, contexts, and the cache.
//!
//! Blueprint and context identities are integer indices handed out from
//! process-wide counters, so cache keys never depend on object addresses and
//! can be printed, compared, and serialized.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_BLUEPRINT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Identities
// ============================================================================

/// Identity of one blueprint object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlueprintId(pub u64);

impl BlueprintId {
    /// Allocate a fresh, never reused id.
    pub fn next() -> Self {
        Self(NEXT_BLUEPRINT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BlueprintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bp#{}", self.0)
    }
}

/// Identity of one binding context object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContextId(pub u64);

impl ContextId {
    /// Allocate a fresh, never reused id.
    pub fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Cache key: one bound instance per (blueprint, context) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub blueprint: BlueprintId,
    pub context: ContextId,
}

impl CacheKey {
    pub fn new(blueprint: BlueprintId, context: ContextId) -> Self {
        Self { blueprint, context }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.blueprint, self.context)
    }
}

// ============================================================================
// Binding context
// ============================================================================

/// The runtime value a blueprint is materialized against.
///
/// Identity is the identity of the context object itself. Implementors
/// allocate a [`ContextId`] once at construction and return it unchanged;
/// two handles to the same context must report the same id.
pub trait BindingContext: Send + Sync + 'static {
    fn context_id(&self) -> ContextId;
}

// ============================================================================
// Verbosity
// ============================================================================

/// Per-blueprint log verbosity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    Silent,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Silent => write!(f, "silent"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
            Self::Debug => write!(f, "debug"),
        }
    }
}
