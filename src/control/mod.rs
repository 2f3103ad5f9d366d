//! Flight phase sequencing and command publishing.

pub mod command_publisher;
pub mod flight_phase;
pub mod race_controller;
pub mod velocity_command;

pub use command_publisher::{CommandPublisher, PublishError};
pub use flight_phase::FlightPhase;
pub use race_controller::RaceController;
pub use velocity_command::{LifecycleCommand, VelocityCommand};
