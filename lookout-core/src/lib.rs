//! # Lookout Core Library
//!
//! Mirrors entities living inside a running game process and classifies each
//! of them, tick after tick, into categories that overlays and automation
//! can act on.
//!
//! - **Memory**: typed, bounds-checked reads over a [`RemoteMemory`]
//! - **Registry**: per-entity capability table and decoded-object cache
//! - **Entity**: sticky type and subtype, per-tick state, proximity zones
//! - **Classify**: ordered first-match rule tables for each stage
//!
//! Nothing read from the game is trusted. A failed or implausible read means
//! "absent this tick" and never surfaces as an error.
//!
//! ## Performance Contract
//!
//! - Refresh of an already classified entity: one header read plus one
//!   re-decode per cached capability
//! - No allocation on the steady-state path apart from re-decoded capabilities

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

pub mod category;
pub mod classify;
pub mod components;
pub mod config;
pub mod entity;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod offsets;
pub mod registry;
pub mod types;
pub mod zone;

pub use category::{EntityState, EntitySubtype, EntityType};
pub use config::LookoutConfig;
pub use entity::{Entity, EntitySummary, RefreshContext, RefreshOutcome};
pub use error::{DecodeError, LookoutError};
pub use memory::{Reader, RemoteMemory, SnapshotMemory};
pub use registry::ComponentRegistry;
pub use types::*;
pub use zone::NearbyZones;

/// Process-wide pipeline counters.
pub static COUNTERS: metrics::LookoutCounters = metrics::LookoutCounters::new();
