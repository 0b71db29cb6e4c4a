//! The agent's tool catalog and how calls against it are executed.

mod content;
pub mod errors;
pub mod executor;
pub mod registry;
mod r#trait;

pub use content::ContentTools;
pub use errors::ToolError;
pub use executor::{ExecutionLimits, execute_batch, execute_one};
pub use r#trait::ToolHost;
pub use registry::{ToolName, ToolRegistry};
