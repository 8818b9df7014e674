use serde::{Deserialize, Serialize};

/// Process-wide read-only planning parameters. No global mutable state: a
/// caller builds one of these (or uses the documented defaults) and passes
/// it to the [`crate::engine::Engine`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    pub walk_speed_m_per_min: f64,
    pub bus_speed_m_per_min: f64,
    pub wait_seconds_per_board: u32,
    pub transfer_settle_seconds: u32,
    pub walk_penalty_weight: f64,
    pub transfer_penalty_seconds: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            walk_speed_m_per_min: 70.0,
            bus_speed_m_per_min: 333.0,
            wait_seconds_per_board: 300,
            transfer_settle_seconds: 180,
            walk_penalty_weight: 5.0,
            transfer_penalty_seconds: 240,
        }
    }
}
