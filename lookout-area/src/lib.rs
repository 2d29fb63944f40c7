//! # lookout-area: Area Driver for Lookout
//!
//! This crate drives the game-agnostic `lookout-core` entity model once per
//! game tick, for whatever area instance the player is currently in.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         game process (remote)           │
//! │   entity list · player · area hash      │
//! └───────────────────┬─────────────────────┘
//!                     │ AreaSnapshot
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  lookout-area                           │
//! │  ┌─────────────┐   ┌─────────────────┐  │
//! │  │ AreaManager │──▶│  AreaInstance   │  │
//! │  └─────────────┘   └────────┬────────┘  │
//! │                             ▼           │
//! │              ┌─────────────────────┐    │
//! │              │    lookout-core     │    │
//! │              └─────────────────────┘    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `area`: one area instance: entity table, per-tick refresh, queries
//! - `manager`: area change detection and reset
//! - `events`: what changed during a tick
//! - `telemetry`: `tracing-subscriber` setup

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod area;
pub mod events;
pub mod manager;
pub mod telemetry;

pub use area::{AreaInstance, AreaSnapshot, EntityKey, RawEntity, TickReport};
pub use events::AreaEvent;
pub use manager::AreaManager;
