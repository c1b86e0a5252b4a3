//! # Forage Kernel
//!
//! The generational coordination core for coordinator-and-forager chain
//! experiments: who sits in which slot, and how one generation's answers
//! become the next generation's seed.
//!
//! ## Architecture
//!
//! ```text
//! TrialRole              ← Creator | Rater, tagged at trial construction
//! SeedDefinition         ← parameter mapping handed to a generation's creator
//! AssignmentTable        ← durable participant -> slot map, one per generation
//! reduce_generation      ← (seed, trials) -> successor seed
//! format / validate      ← slider submissions -> float | INVALID_RESPONSE
//! decode_positions       ← structured XOR textual slot labels
//! CoinField              ← resource field, RNG passed explicitly
//! ```
//!
//! This crate is pure: no I/O, no locking, no clocks, no global randomness.
//! Durability and the per-node critical section live in `forage-chain`.

pub mod answer;
pub mod assignment;
pub mod positions;
pub mod reduce;
pub mod role;
pub mod seed;
pub mod world;

pub use answer::{
    FailedValidation, FormattedAnswer, INVALID_RESPONSE, SliderBounds, format_slider_answer,
    validate_formatted,
};
pub use assignment::{AssignmentError, AssignmentTable, ParticipantKey};
pub use positions::{
    POSITIONS_FIELD, PositionsError, decode_positions, position_for_slot,
    positions_from_definition,
};
pub use reduce::{GenerationTrial, ReduceError, reduce_generation};
pub use role::TrialRole;
pub use seed::{SeedDefinition, SeedError};
pub use world::{Coin, CoinField, FieldParams};
