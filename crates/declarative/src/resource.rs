//! Reconciler trait for declarative state management
//!
//! A reconciler owns the lifecycle of one entity kind against a remote
//! service. The host supplies declared configuration and persisted state
//! and receives the new persisted state back; the reconciler itself keeps
//! nothing between calls.

use crate::context::OperationContext;
use crate::error::{ReconcileError, Result};
use crate::types::{Diagnostics, ResourceState};
use async_trait::async_trait;
use std::fmt;

/// How an entity kind is brought under management by `import`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStrategy {
    /// The external key is the remote id; import reads it
    PassthroughId,
    /// The external key is matched against a human-meaningful field
    LookupByName,
}

/// Lifecycle operations for one remote entity kind
///
/// Declared configuration and persisted state share the `Model` type; they
/// differ only in which fields are known.
///
/// # Example
///
/// ```ignore
/// let state = reconciler.create(&ctx, &declared).await?;
/// match reconciler.read(&ctx, &state).await? {
///     ResourceState::Present(refreshed) => persist(refreshed),
///     ResourceState::Absent => forget(),
/// }
/// ```
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Local declarative model
    type Model: Clone + fmt::Debug + PartialEq + Send + Sync;

    /// Resource type name, e.g. "trust_zone"
    fn resource_type(&self) -> &'static str;

    /// How `import` interprets its key
    fn import_strategy(&self) -> ImportStrategy {
        ImportStrategy::PassthroughId
    }

    /// Advisory checks on declared configuration
    ///
    /// Warnings only; hard validation failures surface from the operation
    /// itself before any remote call.
    fn validate(&self, _declared: &Self::Model) -> Diagnostics {
        Diagnostics::new()
    }

    /// Absent -> Present
    async fn create(&self, ctx: &OperationContext, declared: &Self::Model) -> Result<Self::Model>;

    /// Refresh from the remote, which is authoritative
    ///
    /// A missing entity yields `ResourceState::Absent`, not an error.
    async fn read(
        &self,
        ctx: &OperationContext,
        state: &Self::Model,
    ) -> Result<ResourceState<Self::Model>>;

    /// Full-replace update; `state` must carry the remote id
    async fn update(
        &self,
        ctx: &OperationContext,
        state: &Self::Model,
        declared: &Self::Model,
    ) -> Result<Self::Model>;

    /// Present -> Absent; a missing entity counts as deleted
    async fn delete(&self, ctx: &OperationContext, state: &Self::Model) -> Result<()>;

    /// Bring an existing remote entity under management
    async fn import(&self, ctx: &OperationContext, key: &str) -> Result<Self::Model>;
}

/// Single-entity lookup by filter (a read-only data source)
#[async_trait]
pub trait Lookup: Send + Sync {
    /// Filter fields; any subset may be set
    type Filter: Send + Sync;
    /// Model returned for the match
    type Model: Send;

    /// Return the one entity matching `filter`
    async fn lookup(&self, ctx: &OperationContext, filter: &Self::Filter) -> Result<Self::Model>;
}

/// Human-readable names for an entity kind, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindNames {
    /// Singular, e.g. "trust zone"
    pub singular: &'static str,
    /// Plural, e.g. "trust zones"
    pub plural: &'static str,
}

impl KindNames {
    pub const fn new(singular: &'static str, plural: &'static str) -> Self {
        Self { singular, plural }
    }
}

/// Pick the single item satisfying `matches`
///
/// Zero or several matches are errors; an ambiguous match is never
/// resolved by taking the first one.
pub fn select_single<T>(
    items: Vec<T>,
    names: KindNames,
    summary: &str,
    matches: impl Fn(&T) -> bool,
) -> Result<T> {
    let mut found: Vec<T> = items.into_iter().filter(|item| matches(item)).collect();
    match found.len() {
        0 => Err(ReconcileError::NoMatch {
            summary: summary.to_string(),
            detail: format!("No matching {} found", names.singular),
        }),
        1 => Ok(found.remove(0)),
        count => Err(ReconcileError::MultipleMatches {
            summary: summary.to_string(),
            detail: format!("Multiple {} found", names.plural),
            count,
        }),
    }
}

/// Turn a read result into an import result
///
/// An absent entity cannot be imported.
pub fn present_or_not_found<M>(state: ResourceState<M>, names: KindNames, key: &str) -> Result<M> {
    match state {
        ResourceState::Present(model) => Ok(model),
        ResourceState::Absent => Err(ReconcileError::NoMatch {
            summary: format!("Error importing {}", names.singular),
            detail: format!("Cannot import non-existent remote {} {key:?}", names.singular),
        }),
    }
}
