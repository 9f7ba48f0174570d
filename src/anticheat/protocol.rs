use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::service::ServiceError;
use crate::session::result::TestSummary;
use crate::session::settings::Settings;

/// Local counter distinguishing attempts, so late replies for a reset attempt can be recognized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTimeContext {
    pub local_time: String,
    pub utc_offset_secs: i32,
}

impl LocalTimeContext {
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            local_time: now.to_rfc3339(),
            utc_offset_secs: now.offset().local_minus_utc(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_valid: bool,
    #[serde(default)]
    pub invalid_reason: Option<String>,
    #[serde(default)]
    pub new_achievements: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkAck {
    #[serde(default)]
    pub new_achievements: Vec<String>,
}

/// Work queued by the engine for the service worker, executed strictly in order.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceRequest {
    Start {
        attempt: AttemptId,
        user_id: String,
        settings: Settings,
        target: String,
    },
    Progress {
        attempt: AttemptId,
        session: SessionId,
        typed_len: usize,
    },
    Finalize {
        attempt: AttemptId,
        session: SessionId,
        typed: String,
        elapsed_ms: u64,
        local_time: LocalTimeContext,
    },
    /// Fire-and-forget; produces no reply.
    Cancel { session: SessionId },
    Submit {
        attempt: AttemptId,
        summary: TestSummary,
    },
}

impl ServiceRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceRequest::Start { .. } => "start",
            ServiceRequest::Progress { .. } => "progress",
            ServiceRequest::Finalize { .. } => "finalize",
            ServiceRequest::Cancel { .. } => "cancel",
            ServiceRequest::Submit { .. } => "submit",
        }
    }

    /// Requests that still run after the app has started shutting down. Only these record
    /// a result; the rest would just hold up exit.
    pub fn survives_shutdown(&self) -> bool {
        matches!(
            self,
            ServiceRequest::Finalize { .. } | ServiceRequest::Submit { .. }
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ServiceReply {
    Started {
        attempt: AttemptId,
        result: Result<SessionId, ServiceError>,
    },
    ProgressRecorded {
        attempt: AttemptId,
        typed_len: usize,
        result: Result<(), ServiceError>,
    },
    Finalized {
        attempt: AttemptId,
        result: Result<Verdict, ServiceError>,
    },
    Submitted {
        attempt: AttemptId,
        result: Result<SinkAck, ServiceError>,
    },
}

impl ServiceReply {
    pub fn attempt(&self) -> AttemptId {
        match self {
            ServiceReply::Started { attempt, .. }
            | ServiceReply::ProgressRecorded { attempt, .. }
            | ServiceReply::Finalized { attempt, .. }
            | ServiceReply::Submitted { attempt, .. } => *attempt,
        }
    }
}
