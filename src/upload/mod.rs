//! Upload admission: input entries, in-flight guard and the scheduler

mod entry;
mod guard;
mod job;
mod scheduler;

pub use entry::{FileContents, FileEntry};
pub use guard::InFlightGuard;
pub use job::UploadJob;
pub use scheduler::{AdmissionScheduler, Completion, UploadReport};
