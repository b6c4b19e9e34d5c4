//! Type definitions

pub mod alert;
pub mod eta;
pub mod geo;
pub mod messages;
pub mod route;
pub mod schedule;
pub mod simulation;
pub mod vehicle;

pub use alert::*;
pub use eta::*;
pub use geo::*;
pub use messages::*;
pub use route::*;
pub use schedule::*;
pub use simulation::*;
pub use vehicle::*;
