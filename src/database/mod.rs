//! # Table Module
//!
//! In-memory tables and the operations that reconcile them: column checks,
//! merge strategies and post-merge pruning.
pub mod column;
pub mod merge;
pub mod prune;
pub mod table;
