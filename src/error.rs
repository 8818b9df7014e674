use thiserror::Error;

/// Error taxonomy for the route planning engine, in decreasing severity.
///
/// `BadGeometry` and `BadCandidateOrdering` are recovered per-candidate and
/// never reach a caller; `StoreUnavailable` is recovered with whatever
/// itineraries were already built; `NoItineraries` is always resolved into
/// the walk-only fallback. Only `BadRequest` is meant to surface as an HTTP
/// 400.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A spatial-store call failed or timed out.
    #[error("spatial store unavailable: {0}")]
    StoreUnavailable(String),

    /// A pattern polyline violates an invariant (fewer than 2 vertices).
    #[error("bad geometry for pattern {0}")]
    BadGeometry(String),

    /// Projected indices violate the ordering constraints for a candidate.
    #[error("candidate ordering invalid")]
    BadCandidateOrdering,

    /// The request's coordinates could not be parsed.
    #[error("malformed request: {0}")]
    BadRequest(String),

    /// No itinerary survived construction (always recovered by the caller).
    #[error("no itineraries produced")]
    NoItineraries,
}

pub type Result<T> = std::result::Result<T, EngineError>;
