pub mod cover_letter;
pub mod element_waiter;
pub mod field_strategy;
pub mod form_filler;
pub mod local_store;
pub mod platform_classifier;
pub mod profile_resolver;
pub mod status_reporter;
pub mod submission;

pub use element_waiter::{ElementWaiter, WaitOutcome};
pub use field_strategy::{strategy_for, FieldKind, FieldMap, FieldSpec, PlatformStrategy};
pub use form_filler::FormFiller;
pub use local_store::LocalStore;
pub use platform_classifier::{classify, is_supported};
pub use profile_resolver::ProfileResolver;
pub use status_reporter::{RemoteStatusSink, StatusReporter};
pub use submission::{SubmissionController, SubmitSignal};
