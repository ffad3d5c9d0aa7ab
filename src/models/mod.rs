pub mod job;
pub mod platform;
pub mod profile;
pub mod report;
pub mod session;

pub use job::{JobDescriptor, JobId, JobStatus};
pub use platform::PlatformVariant;
pub use profile::{BackendProfile, CandidateProfile, ProfileOrigin, ResolvedProfile};
pub use report::{FieldOutcome, FillReport, SkipReason};
pub use session::{AutomationSession, ProgressEvent, RunOutcome, RunSummary, SessionState};
