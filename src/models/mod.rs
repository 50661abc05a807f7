pub mod failure;
pub mod report;
pub mod status;

pub use failure::{FailureAnalysis, FailureType, Priority, RawFailure, RuleAnalysis};
pub use report::{Attachment, RunReport, RunSummary, Spec, Suite, TestEntry, TestError, TestResult};
pub use status::TestStatus;
