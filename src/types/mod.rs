mod execution;
mod identifiers;
mod record;
mod result;
mod source;

pub use execution::{Any, Execution, ObjectMeta, PayloadKind, TaskRun, TASK_RUN_TYPE_URL};
pub use identifiers::ObjectKey;
pub use record::{ListRecordsRequest, ListRecordsResponse, Record, StoredRecord};
pub use result::RunResult;
pub use source::SourceObject;
