pub mod orchestrator;
pub mod run;

pub use orchestrator::{AttemptOutcome, ProducedPost, RetryOrchestrator, ATTEMPT_HINTS};
pub use run::{publish, DuplicateStatus, Pipeline, RunReport, DEFAULT_DUPLICATE_PENALTY};
