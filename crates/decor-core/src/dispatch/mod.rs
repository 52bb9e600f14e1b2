//! Dispatch from a declared command to the capability that executes it.
//!
//! ## Components
//!
//! - `CommandExecutor` trait - Common interface for every leaf capability
//! - `DispatchRegistry` - Maps command kinds to executors
//! - `Dispatch` - What the registry hands back for a command

mod registry;
mod traits;

pub use registry::{Dispatch, DispatchRegistry};
pub use traits::CommandExecutor;
