pub mod job_store;
pub mod persister;
pub mod storage;
pub mod validator;

pub use job_store::{JobStore, PgJobStore};
pub use persister::{artifact_filename, persist, PersistFieldError};
pub use storage::{ObjectStore, S3ObjectStore, UploadError};
pub use validator::{validate, ValidationError};
