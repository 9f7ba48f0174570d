use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::anticheat::protocol::{ServiceReply, ServiceRequest};
use crate::service::{ResultSink, ServiceError, ValidationService};

/// Background thread running service calls one at a time, in the order they were sent.
pub struct ServiceWorker {
    tx: Option<mpsc::Sender<ServiceRequest>>,
    rx: mpsc::Receiver<ServiceReply>,
    closing: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ServiceWorker {
    pub fn spawn(
        mut validation: Option<Box<dyn ValidationService>>,
        mut sink: Box<dyn ResultSink>,
    ) -> Self {
        let (req_tx, req_rx) = mpsc::channel::<ServiceRequest>();
        let (reply_tx, reply_rx) = mpsc::channel();
        let closing = Arc::new(AtomicBool::new(false));

        let worker_closing = Arc::clone(&closing);
        let handle = thread::spawn(move || {
            while let Ok(request) = req_rx.recv() {
                if worker_closing.load(Ordering::Acquire) && !request.survives_shutdown() {
                    debug!(kind = request.kind(), "skipped on shutdown");
                    continue;
                }
                debug!(kind = request.kind(), "service request");
                if let Some(reply) = execute(&mut validation, sink.as_mut(), request)
                    && reply_tx.send(reply).is_err()
                {
                    return;
                }
            }
        });

        Self {
            tx: Some(req_tx),
            rx: reply_rx,
            closing,
            handle: Some(handle),
        }
    }

    pub fn send(&self, request: ServiceRequest) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(request).is_err() {
            warn!("service worker stopped, request dropped");
        }
    }

    pub fn send_all(&self, requests: impl IntoIterator<Item = ServiceRequest>) {
        for request in requests {
            self.send(request);
        }
    }

    /// Replies received so far, without blocking.
    pub fn drain(&self) -> Vec<ServiceReply> {
        self.rx.try_iter().collect()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ServiceReply> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl Drop for ServiceWorker {
    /// Closes the queue and waits for queued finalize and submit calls. Anything else still
    /// queued is skipped.
    fn drop(&mut self) {
        self.closing.store(true, Ordering::Release);
        self.tx.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("service worker panicked");
        }
    }
}

fn execute(
    validation: &mut Option<Box<dyn ValidationService>>,
    sink: &mut dyn ResultSink,
    request: ServiceRequest,
) -> Option<ServiceReply> {
    let unavailable = || ServiceError::Unavailable("no validation service configured".to_string());

    match request {
        ServiceRequest::Start {
            attempt,
            user_id,
            settings,
            target,
        } => {
            let result = match validation.as_mut() {
                Some(service) => service.start_session(&user_id, &settings, &target),
                None => Err(unavailable()),
            };
            Some(ServiceReply::Started { attempt, result })
        }
        ServiceRequest::Progress {
            attempt,
            session,
            typed_len,
        } => {
            let result = match validation.as_mut() {
                Some(service) => service.record_progress(&session, typed_len),
                None => Err(unavailable()),
            };
            Some(ServiceReply::ProgressRecorded {
                attempt,
                typed_len,
                result,
            })
        }
        ServiceRequest::Finalize {
            attempt,
            session,
            typed,
            elapsed_ms,
            local_time,
        } => {
            let result = match validation.as_mut() {
                Some(service) => {
                    service.finalize_session(&session, &typed, elapsed_ms, &local_time)
                }
                None => Err(unavailable()),
            };
            Some(ServiceReply::Finalized { attempt, result })
        }
        ServiceRequest::Cancel { session } => {
            if let Some(service) = validation.as_mut()
                && let Err(err) = service.cancel_session(&session)
            {
                debug!(error = %err, session = %session.0, "cancel failed");
            }
            None
        }
        ServiceRequest::Submit { attempt, summary } => {
            let result = sink.submit(&summary);
            Some(ServiceReply::Submitted { attempt, result })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Instant;

    use super::*;
    use crate::anticheat::protocol::{
        AttemptId, LocalTimeContext, SessionId, SinkAck, Verdict,
    };
    use crate::session::result::TestSummary;
    use crate::session::settings::Settings;

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
        progress_delay: Duration,
    }

    impl Recorder {
        fn push(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ValidationService for Recorder {
        fn start_session(
            &mut self,
            user_id: &str,
            _settings: &Settings,
            _target: &str,
        ) -> Result<SessionId, ServiceError> {
            self.push(format!("start {user_id}"));
            Ok(SessionId("s1".to_string()))
        }

        fn record_progress(
            &mut self,
            _session: &SessionId,
            typed_len: usize,
        ) -> Result<(), ServiceError> {
            thread::sleep(self.progress_delay);
            self.push(format!("progress {typed_len}"));
            Ok(())
        }

        fn finalize_session(
            &mut self,
            _session: &SessionId,
            typed: &str,
            _elapsed_ms: u64,
            _local_time: &LocalTimeContext,
        ) -> Result<Verdict, ServiceError> {
            self.push(format!("finalize {typed}"));
            Ok(Verdict {
                is_valid: true,
                ..Verdict::default()
            })
        }

        fn cancel_session(&mut self, session: &SessionId) -> Result<(), ServiceError> {
            self.push(format!("cancel {}", session.0));
            Err(ServiceError::SessionExpired)
        }
    }

    impl ResultSink for Recorder {
        fn submit(&mut self, summary: &TestSummary) -> Result<SinkAck, ServiceError> {
            self.push(format!("submit {}", summary.typed_chars));
            Ok(SinkAck::default())
        }
    }

    fn session() -> SessionId {
        SessionId("s1".to_string())
    }

    #[test]
    fn test_requests_run_in_order() {
        let recorder = Recorder::default();
        let worker = ServiceWorker::spawn(
            Some(Box::new(recorder.clone())),
            Box::new(recorder.clone()),
        );
        let attempt = AttemptId(1);

        worker.send_all([
            ServiceRequest::Start {
                attempt,
                user_id: "u".to_string(),
                settings: Settings::default(),
                target: "abc".to_string(),
            },
            ServiceRequest::Progress {
                attempt,
                session: session(),
                typed_len: 10,
            },
            ServiceRequest::Progress {
                attempt,
                session: session(),
                typed_len: 20,
            },
            ServiceRequest::Cancel { session: session() },
            ServiceRequest::Finalize {
                attempt,
                session: session(),
                typed: "abc".to_string(),
                elapsed_ms: 1000,
                local_time: LocalTimeContext::now(),
            },
        ]);
        for _ in 0..4 {
            assert!(worker.recv_timeout(Duration::from_secs(5)).is_some());
        }

        assert_eq!(
            recorder.calls(),
            vec![
                "start u",
                "progress 10",
                "progress 20",
                "cancel s1",
                "finalize abc"
            ]
        );
    }

    #[test]
    fn test_shutdown_skips_progress_and_keeps_submit() {
        let recorder = Recorder {
            progress_delay: Duration::from_millis(100),
            ..Recorder::default()
        };
        let worker = ServiceWorker::spawn(
            Some(Box::new(recorder.clone())),
            Box::new(recorder.clone()),
        );
        let attempt = AttemptId(2);
        let summary = TestSummary::from_attempt(
            "abc",
            "abc",
            &Settings::default(),
            Duration::from_secs(1),
        );

        let progress = (1..=30).map(|typed_len| ServiceRequest::Progress {
            attempt,
            session: session(),
            typed_len,
        });
        worker.send_all(progress.chain([
            ServiceRequest::Cancel { session: session() },
            ServiceRequest::Submit { attempt, summary },
        ]));

        let started = Instant::now();
        drop(worker);
        assert!(started.elapsed() < Duration::from_secs(1));

        let calls = recorder.calls();
        assert_eq!(calls.last().map(String::as_str), Some("submit 3"));
        assert!(calls.len() <= 2, "{calls:?}");
    }

    #[test]
    fn test_replies_carry_attempt_and_cancel_is_silent() {
        let recorder = Recorder::default();
        let worker = ServiceWorker::spawn(Some(Box::new(recorder.clone())), Box::new(recorder));

        worker.send(ServiceRequest::Cancel { session: session() });
        worker.send(ServiceRequest::Progress {
            attempt: AttemptId(7),
            session: session(),
            typed_len: 3,
        });

        let reply = worker.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(
            reply,
            ServiceReply::ProgressRecorded {
                attempt: AttemptId(7),
                typed_len: 3,
                result: Ok(()),
            }
        );
        assert!(worker.recv_timeout(Duration::from_millis(50)).is_none());
    }

    #[test]
    fn test_missing_validation_service_reports_unavailable() {
        let recorder = Recorder::default();
        let worker = ServiceWorker::spawn(None, Box::new(recorder.clone()));
        worker.send(ServiceRequest::Start {
            attempt: AttemptId(1),
            user_id: "u".to_string(),
            settings: Settings::default(),
            target: "abc".to_string(),
        });

        match worker.recv_timeout(Duration::from_secs(5)) {
            Some(ServiceReply::Started {
                result: Err(ServiceError::Unavailable(_)),
                ..
            }) => {}
            other => panic!("unexpected reply: {other:?}"),
        }
        assert!(recorder.calls().is_empty());
    }
}
