//! Built-in leaf executors.
//!
//! File and process executors act directly; service, data, batch, and ETL
//! executors drive external programs configured as [`CommandTemplate`]s.

mod batch;
mod data;
mod etl;
mod file;
mod process;
mod service;
mod template;

pub use batch::BatchExecutor;
pub use data::DataExecutor;
pub use etl::EtlExecutor;
pub use file::FileExecutor;
pub use process::ProcessExecutor;
pub use service::ServiceExecutor;
pub use template::CommandTemplate;
