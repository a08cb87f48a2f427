pub mod activation;
mod context;
mod executor;
mod prerequisites;
mod steps;
pub mod types;

pub use context::SetupContext;
pub use executor::run_steps;
pub use prerequisites::check_prerequisites;
pub use steps::validate_endpoint;
pub use types::{BatchReport, SetupInputs, StepId, StepOutcome, parse_step_list};

#[cfg(test)]
mod tests;
