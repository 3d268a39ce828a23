//! Domain records shared by the accessor, identity resolver and coordinator

pub mod client;
pub mod job;
pub mod location;

pub use client::{Client, ClientKind, Share, TransferUser, UserRole};
pub use job::{job_code, JobMetadata, JobRecord, NewJob, NewTask, TaskSource};
pub use location::Location;
