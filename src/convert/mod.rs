mod record;
mod task_run;

pub use record::{to_api, to_storage};
pub use task_run::to_execution;
