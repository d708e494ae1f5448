pub mod error;
pub mod evaluation;
pub mod input;
pub mod kpi;
pub mod normalize;
pub mod profile;
pub mod scoring;
pub mod solver;

pub use error::ScoreError;
pub use evaluation::*;
pub use input::*;
pub use kpi::*;
pub use normalize::*;
pub use profile::*;
pub use scoring::*;
pub use solver::*;
