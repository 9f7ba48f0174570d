pub mod protocol;
pub mod reporter;

pub use protocol::{AttemptId, ServiceReply, ServiceRequest, SessionId, Verdict};
pub use reporter::{FinishPath, ProgressReporter, ReportPolicy};
