pub mod annotation;
pub mod convert;
pub mod db;
pub mod error;
pub mod name;
pub mod patch;
pub mod reconciler;
pub mod source;
pub mod types;

pub use db::ResultsDb;
pub use error::{ConversionError, NameParseError, Result, ResultsError};
pub use reconciler::{ReconcileContext, ReconcileOutcome, ResultSyncReconciler};
pub use types::*;
