//! Application services for task configuration and lifecycle orchestration.

mod configuration;
mod dates;
mod lifecycle;

pub use configuration::{ConfigurationMode, TaskConfigurationError, TaskConfigurator};
pub use dates::{DateCalculator, DateInputs};
pub use lifecycle::{
    InitiateTaskRequest, TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService,
};
