//! Multi-modal transit route planning engine: spatial search over line
//! geometries and scheduled stops, itinerary construction for 0–3 transfer
//! shapes, generalized-cost ranking, and OTP-compatible serialization.

pub mod builders;
pub mod config;
pub mod engine;
pub mod error;
pub mod geodesy;
pub mod model;
pub mod otp;
pub mod rank;
pub mod server;
pub mod store;

pub use config::EngineConfig;
pub use engine::{Deadline, Engine, PlanRequest};
pub use error::{EngineError, Result};
