use std::mem;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::anticheat::protocol::{AttemptId, LocalTimeContext, ServiceRequest, SessionId};
use crate::service::ServiceError;
use crate::session::settings::Settings;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportPolicy {
    pub char_threshold: usize,
    pub interval: Duration,
}

impl Default for ReportPolicy {
    fn default() -> Self {
        Self {
            char_threshold: 25,
            interval: Duration::from_secs(5),
        }
    }
}

/// Last progress the service acknowledged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Watermark {
    pub typed_len: usize,
    pub at: Instant,
}

/// Whether a progress report is due for `typed_len` at `now`.
///
/// Nothing is due unless the length exceeds both the acknowledged watermark and everything
/// already sent; past that, either enough new characters or enough time since the watermark
/// makes it due.
pub fn report_due(
    policy: &ReportPolicy,
    watermark: Watermark,
    sent_max: usize,
    now: Instant,
    typed_len: usize,
) -> bool {
    if typed_len <= watermark.typed_len || typed_len <= sent_max {
        return false;
    }
    typed_len - watermark.typed_len >= policy.char_threshold
        || now.saturating_duration_since(watermark.at) >= policy.interval
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Starting,
    Open(SessionId),
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinishPath {
    /// A finalize request was queued; the verdict arrives later.
    Finalizing,
    /// No session is open, the attempt goes through the plain result sink.
    Unverified,
}

/// Client side of the anti-cheat protocol for one user. Owns the only copy of the session id.
#[derive(Debug)]
pub struct ProgressReporter {
    user_id: String,
    policy: ReportPolicy,
    attempt: Option<AttemptId>,
    phase: Phase,
    watermark: Option<Watermark>,
    sent_max: usize,
    in_flight: Option<(usize, Instant)>,
}

impl ProgressReporter {
    pub fn new(user_id: impl Into<String>, policy: ReportPolicy) -> Self {
        Self {
            user_id: user_id.into(),
            policy,
            attempt: None,
            phase: Phase::Idle,
            watermark: None,
            sent_max: 0,
            in_flight: None,
        }
    }

    #[cfg(test)]
    fn session_id(&self) -> Option<&SessionId> {
        match &self.phase {
            Phase::Open(id) => Some(id),
            _ => None,
        }
    }

    pub fn watermark(&self) -> Option<Watermark> {
        self.watermark
    }

    pub fn begin(
        &mut self,
        attempt: AttemptId,
        settings: &Settings,
        target: &str,
        out: &mut Vec<ServiceRequest>,
    ) {
        self.attempt = Some(attempt);
        self.phase = Phase::Starting;
        self.watermark = None;
        self.sent_max = 0;
        self.in_flight = None;
        debug!(attempt = attempt.0, "requesting anti-cheat session");
        out.push(ServiceRequest::Start {
            attempt,
            user_id: self.user_id.clone(),
            settings: settings.clone(),
            target: target.to_string(),
        });
    }

    pub fn on_input(&mut self, typed_len: usize, now: Instant, out: &mut Vec<ServiceRequest>) {
        let (Some(attempt), Phase::Open(session)) = (self.attempt, &self.phase) else {
            return;
        };
        if self.in_flight.is_some() {
            return;
        }
        let Some(watermark) = self.watermark else {
            return;
        };
        if !report_due(&self.policy, watermark, self.sent_max, now, typed_len) {
            return;
        }

        self.in_flight = Some((typed_len, now));
        self.sent_max = typed_len;
        out.push(ServiceRequest::Progress {
            attempt,
            session: session.clone(),
            typed_len,
        });
    }

    /// Close the session for a finished attempt: flush any unreported progress, then finalize.
    pub fn finish(
        &mut self,
        typed: &str,
        elapsed: Duration,
        out: &mut Vec<ServiceRequest>,
    ) -> FinishPath {
        let phase = mem::replace(&mut self.phase, Phase::Closed);
        let (Some(attempt), Phase::Open(session)) = (self.attempt, phase) else {
            return FinishPath::Unverified;
        };

        let typed_len = typed.chars().count();
        let acked = self.watermark.map_or(0, |w| w.typed_len);
        if typed_len > acked && typed_len > self.sent_max {
            self.sent_max = typed_len;
            out.push(ServiceRequest::Progress {
                attempt,
                session: session.clone(),
                typed_len,
            });
        }

        out.push(ServiceRequest::Finalize {
            attempt,
            session,
            typed: typed.to_string(),
            elapsed_ms: elapsed.as_millis() as u64,
            local_time: LocalTimeContext::now(),
        });
        FinishPath::Finalizing
    }

    /// Drop the current attempt's session. A start still in flight is cancelled when its id lands.
    pub fn cancel(&mut self, out: &mut Vec<ServiceRequest>) {
        if let Phase::Open(session) = mem::replace(&mut self.phase, Phase::Idle) {
            debug!(session = %session.0, "cancelling anti-cheat session");
            out.push(ServiceRequest::Cancel { session });
        }
        self.in_flight = None;
    }

    pub fn on_started(
        &mut self,
        attempt: AttemptId,
        result: Result<SessionId, ServiceError>,
        now: Instant,
        out: &mut Vec<ServiceRequest>,
    ) {
        let current = self.attempt == Some(attempt) && self.phase == Phase::Starting;
        match (current, result) {
            (true, Ok(session)) => {
                debug!(session = %session.0, "anti-cheat session open");
                self.phase = Phase::Open(session);
                self.watermark = Some(Watermark { typed_len: 0, at: now });
            }
            (true, Err(err)) => {
                warn!(error = %err, "anti-cheat session unavailable, attempt stays unverified");
                self.phase = Phase::Closed;
            }
            (false, Ok(session)) => {
                debug!(session = %session.0, attempt = attempt.0, "cancelling stale session");
                out.push(ServiceRequest::Cancel { session });
            }
            (false, Err(_)) => {}
        }
    }

    pub fn on_progress(
        &mut self,
        attempt: AttemptId,
        typed_len: usize,
        result: Result<(), ServiceError>,
        now: Instant,
    ) {
        if self.attempt != Some(attempt) {
            return;
        }
        let sent_at = match self.in_flight {
            Some((len, at)) if len == typed_len => {
                self.in_flight = None;
                Some(at)
            }
            _ => None,
        };

        match result {
            Ok(()) => {
                if self.watermark.is_none_or(|w| typed_len > w.typed_len) {
                    self.watermark = Some(Watermark {
                        typed_len,
                        at: sent_at.unwrap_or(now),
                    });
                }
            }
            Err(err) => warn!(error = %err, typed_len, "progress report failed"),
        }
    }
}
