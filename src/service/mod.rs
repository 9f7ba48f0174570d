pub mod error;
#[cfg(feature = "network")]
pub mod http;
pub mod local;
pub mod worker;

pub use error::ServiceError;

use crate::anticheat::protocol::{LocalTimeContext, SessionId, SinkAck, Verdict};
use crate::session::result::TestSummary;
use crate::session::settings::Settings;

/// Server-side anti-cheat sessions. Calls block; they only ever run on the service worker thread.
pub trait ValidationService: Send {
    fn start_session(
        &mut self,
        user_id: &str,
        settings: &Settings,
        target: &str,
    ) -> Result<SessionId, ServiceError>;

    fn record_progress(&mut self, session: &SessionId, typed_len: usize)
    -> Result<(), ServiceError>;

    fn finalize_session(
        &mut self,
        session: &SessionId,
        typed: &str,
        elapsed_ms: u64,
        local_time: &LocalTimeContext,
    ) -> Result<Verdict, ServiceError>;

    fn cancel_session(&mut self, session: &SessionId) -> Result<(), ServiceError>;
}

/// Destination for unverified results.
pub trait ResultSink: Send {
    fn submit(&mut self, summary: &TestSummary) -> Result<SinkAck, ServiceError>;
}
