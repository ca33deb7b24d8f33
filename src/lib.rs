pub mod config;
pub mod error;
pub mod render;
pub mod source;
pub mod submission;
pub mod sync;

pub use config::{StatusFilter, SyncArgs, SyncConfig, SyncConfigBuilder};
pub use error::{FetchError, MalformedRecord, PersistError, SyncError};
pub use source::{GraphqlOptions, GraphqlSource, QueryShape, QueryVariant, SubmissionSource};
pub use submission::{Language, Submission};
pub use sync::{persist, run, PersistFailure, SyncResult};
