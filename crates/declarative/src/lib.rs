//! # Declarative
//!
//! A framework for reconciling remote entities with declared configuration.
//!
//! This crate provides the kind-agnostic half of a declarative provider:
//! the lifecycle contract every entity kind implements, the rules for
//! attributes the remote side may assign, and the error taxonomy reported
//! back to the host.
//!
//! ## Core Concepts
//!
//! - **Reconciler**: Create/Read/Update/Delete/Import for one entity kind
//! - **ResourceState**: Present with a model, or Absent
//! - **Merge policy**: response, then declared, then prior, then unknown
//! - **Diagnostics**: (severity, summary, detail) triples for the host
//! - **OperationContext**: cancellation and deadline for the remote call
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{merge, OperationContext, Reconciler, ResourceState};
//!
//! let ctx = OperationContext::new().with_timeout(Duration::from_secs(30));
//! let created = zones.create(&ctx, &declared).await?;
//!
//! // org_id was not declared; the server's value is kept from now on
//! let org_id = merge::resolve(response.org_id, declared.org_id, None);
//! ```
//!
//! Reconcilers receive their remote service handles through their
//! constructors; nothing in this crate holds global state.

pub mod context;
pub mod error;
pub mod merge;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::OperationContext;
pub use error::{ReconcileError, Result};
pub use merge::Blank;
pub use resource::{
    ImportStrategy, KindNames, Lookup, Reconciler, present_or_not_found, select_single,
};
pub use types::{Diagnostic, Diagnostics, ResourceState, Severity};
