pub mod config;
pub mod protocol;
pub mod report;
pub mod server;
pub mod transport;

pub use config::{SimulatorConfig, StartupError};
pub use report::SimulationReport;
pub use server::SimulatorServer;
