//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: the JSON-lines release store.
//!
//! Adapters translate between domain types and storage representations and
//! contain no business logic.

pub mod persistence;
