use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::anticheat::protocol::{LocalTimeContext, SessionId, SinkAck, Verdict};
use crate::service::{ResultSink, ServiceError, ValidationService};
use crate::session::result::TestSummary;
use crate::session::settings::Settings;

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Network(err.to_string())
        }
    }
}

#[derive(Serialize)]
struct StartBody<'a> {
    user_id: &'a str,
    settings: &'a Settings,
    target: &'a str,
}

#[derive(Deserialize)]
struct StartResponse {
    session_id: SessionId,
}

#[derive(Serialize)]
struct ProgressBody {
    typed_len: usize,
}

#[derive(Serialize)]
struct FinalizeBody<'a> {
    typed: &'a str,
    elapsed_ms: u64,
    #[serde(flatten)]
    local_time: &'a LocalTimeContext,
}

/// JSON-over-HTTP client for both the validation service and the result sink.
#[derive(Clone, Debug)]
pub struct HttpService {
    client: Client,
    base_url: String,
}

impl HttpService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, ServiceError> {
        let response = request.send()?;
        let status = response.status();
        if status == StatusCode::GONE {
            return Err(ServiceError::SessionExpired);
        }
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(ServiceError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

impl ValidationService for HttpService {
    fn start_session(
        &mut self,
        user_id: &str,
        settings: &Settings,
        target: &str,
    ) -> Result<SessionId, ServiceError> {
        let body = StartBody {
            user_id,
            settings,
            target,
        };
        let response = self.send(self.client.post(self.url("/sessions")).json(&body))?;
        let started: StartResponse = response.json()?;
        Ok(started.session_id)
    }

    fn record_progress(
        &mut self,
        session: &SessionId,
        typed_len: usize,
    ) -> Result<(), ServiceError> {
        let url = self.url(&format!("/sessions/{}/progress", session.0));
        self.send(self.client.post(url).json(&ProgressBody { typed_len }))?;
        Ok(())
    }

    fn finalize_session(
        &mut self,
        session: &SessionId,
        typed: &str,
        elapsed_ms: u64,
        local_time: &LocalTimeContext,
    ) -> Result<Verdict, ServiceError> {
        let url = self.url(&format!("/sessions/{}/finalize", session.0));
        let body = FinalizeBody {
            typed,
            elapsed_ms,
            local_time,
        };
        Ok(self.send(self.client.post(url).json(&body))?.json()?)
    }

    fn cancel_session(&mut self, session: &SessionId) -> Result<(), ServiceError> {
        let url = self.url(&format!("/sessions/{}", session.0));
        self.send(self.client.delete(url))?;
        Ok(())
    }
}

impl ResultSink for HttpService {
    fn submit(&mut self, summary: &TestSummary) -> Result<SinkAck, ServiceError> {
        Ok(self
            .send(self.client.post(self.url("/results")).json(summary))?
            .json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let service =
            HttpService::new("https://api.example.test/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            service.url("/sessions"),
            "https://api.example.test/sessions"
        );
    }

    #[test]
    fn test_finalize_body_flattens_local_time() {
        let local_time = LocalTimeContext {
            local_time: "2024-01-01T10:00:00+02:00".to_string(),
            utc_offset_secs: 7200,
        };
        let body = FinalizeBody {
            typed: "abc",
            elapsed_ms: 1200,
            local_time: &local_time,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["typed"], "abc");
        assert_eq!(json["elapsed_ms"], 1200);
        assert_eq!(json["utc_offset_secs"], 7200);
    }

    #[test]
    fn test_unreachable_host_is_network_error() {
        let mut service =
            HttpService::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let err = service
            .cancel_session(&SessionId("s1".to_string()))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Network(_)), "{err:?}");
    }
}
