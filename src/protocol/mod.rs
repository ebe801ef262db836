//! Line protocol support for the binary.
//!
//! Integer identity translation, scenario configuration, and the command
//! parser for the main loop.

pub mod ids;
pub mod parser;
pub mod scenario;

pub use ids::{IdMap, OneToOneMap};
pub use parser::{parse_command, Command};
pub use scenario::{GarrisonSpec, HandSpec, LocationSpec, Scenario, ScenarioError};
