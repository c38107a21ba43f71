//! data — discrete domains, validated node data, and parent-state indexing.
//!
//! Purpose
//! -------
//! Provide the input layer shared by every node-local learner: declared
//! variable domains, an aligned child/parent dataset validated against those
//! domains, and the mixed-radix indexer that maps parent tuples to flat
//! combination indices.
//!
//! Key behaviors
//! -------------
//! - [`Domain`] enforces `lwb <= upb` and handles value/state offsets.
//! - [`NodeData`] checks shapes and value ranges exactly once.
//! - [`ParentIndexer`] encodes/decodes parent tuples and enforces the cell
//!   cap before any statistics are computed.
//! - All failures surface as [`DataError`].
//!
//! Downstream usage
//! ----------------
//! - CPT and logit learners consume `&NodeData` and build a
//!   `ParentIndexer` from `NodeData::parent_domains`.

pub mod domain;
pub mod errors;
pub mod indexer;
pub mod node_data;
pub mod validation;

// ---- Re-exports (primary public surface) ---
pub use self::domain::Domain;
pub use self::errors::{Column, DataError, DataResult};
pub use self::indexer::ParentIndexer;
pub use self::node_data::NodeData;

pub mod prelude {
    pub use super::{Column, DataError, DataResult, Domain, NodeData, ParentIndexer};
}
