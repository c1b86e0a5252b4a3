//! Chain-node boundary for the forage experiment core.
//!
//! This is the durability layer over `forage-kernel`:
//! - node state (seed, vars, trials) persisted as one JSON document
//! - lock-scoped read-modify-write mutation, the allocator's critical section
//! - the allocate-slot and summarize-generation entry points the chain
//!   engine calls
//! - experiment configuration
//!
//! Chain construction itself (creating nodes, sequencing trials, spawning
//! successors) belongs to the host framework; this crate only computes and
//! stores.

pub mod allocate;
pub mod atomic;
pub mod config;
pub mod node;
pub mod store;
pub mod summarize;
pub mod trial;

pub use allocate::{
    AllocateError, SlotOutcome, SlotRequest, allocate_slot_json, assigned_position_json,
};
pub use atomic::{AtomicNodeError, mutate_node_json, node_lock_path};
pub use config::{ConfigError, ExperimentConfig};
pub use node::{ASSIGNMENTS_VAR, NodeState, NodeStateError};
pub use store::{NodeFileError, read_node_from_path, write_node_to_path};
pub use summarize::{SummarizeError, summarize_generation, summarize_generation_json};
pub use trial::Trial;
