use serde::Deserialize;
use strum_macros::Display;

/// The discrete stage of the race the vehicle is currently executing.
///
/// Exactly one phase is active at a time; transitions happen only inside the
/// controller's tick. There is no terminal phase, the loop runs until it is
/// externally interrupted.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy, Hash, Deserialize)]
pub enum FlightPhase {
    Takeoff,
    Hover,
    LineFollow,
    GateAlignment,
    Land,
}
