use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::camera::EncodedFrame;
use crate::common::{FaceGateError, Result, ServiceConfig};
use crate::core::outcome::AttemptOutcome;
use crate::core::session::AuthenticatedUser;
use crate::service::protocol::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, UserRecord, UsersResponse,
};

/// Fallback when the service fails without a usable message body.
const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// The two operations the controller and the registration flow need from
/// the remote service. Stateless request/response; retry policy lives with
/// the callers.
pub trait RecognitionApi: Send + Sync {
    fn login(&self, frame: &EncodedFrame) -> AttemptOutcome;
    fn register(&self, name: &str, frame: &EncodedFrame) -> Result<String>;
}

pub struct HttpRecognitionClient {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpRecognitionClient {
    pub fn new(config: &ServiceConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn shared(config: &ServiceConfig) -> Arc<dyn RecognitionApi> {
        Arc::new(Self::new(config))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn list_users(&self) -> Result<Vec<UserRecord>> {
        let response = self
            .agent
            .get(&self.url("/api/users"))
            .call()
            .map_err(|e| FaceGateError::Service(failure_message(e)))?;
        let body: UsersResponse = response
            .into_json()
            .map_err(|e| FaceGateError::Service(format!("Invalid response body: {}", e)))?;
        Ok(body.users)
    }

    pub fn delete_user(&self, name: &str) -> Result<String> {
        let path = format!("/api/users/{}", urlencoding::encode(name));
        let response = self
            .agent
            .delete(&self.url(&path))
            .call()
            .map_err(|e| FaceGateError::Service(failure_message(e)))?;
        let body: MessageResponse = response
            .into_json()
            .map_err(|e| FaceGateError::Service(format!("Invalid response body: {}", e)))?;
        Ok(body.message)
    }
}

impl RecognitionApi for HttpRecognitionClient {
    fn login(&self, frame: &EncodedFrame) -> AttemptOutcome {
        let result = self
            .agent
            .post(&self.url("/api/login"))
            .send_json(LoginRequest {
                image: frame.as_data_url(),
            });
        classify_login(result)
    }

    fn register(&self, name: &str, frame: &EncodedFrame) -> Result<String> {
        let result = self
            .agent
            .post(&self.url("/api/register"))
            .send_json(RegisterRequest {
                name,
                image: frame.as_data_url(),
            });
        match result {
            Ok(response) => {
                let body: MessageResponse = response
                    .into_json()
                    .map_err(|e| FaceGateError::Service(format!("Invalid response body: {}", e)))?;
                Ok(body.message)
            }
            Err(e) => Err(FaceGateError::Service(failure_message(e))),
        }
    }
}

/// The single place login responses become outcomes. Everything the match
/// arms below do not claim explicitly falls through to `TransientFailure`.
fn classify_login(result: std::result::Result<ureq::Response, ureq::Error>) -> AttemptOutcome {
    match result {
        Ok(response) => match response.into_json::<LoginResponse>() {
            Ok(body) => match (body.success, body.user) {
                (true, Some(user)) => {
                    AttemptOutcome::Success(AuthenticatedUser::new(user.name, user.confidence))
                }
                _ => AttemptOutcome::TransientFailure(
                    "Service reported success without a user".into(),
                ),
            },
            Err(e) => AttemptOutcome::TransientFailure(format!("Invalid response body: {}", e)),
        },
        Err(ureq::Error::Status(code, response)) => {
            let message = error_body_message(response);
            debug!(code, message = message.as_deref(), "login rejected");
            match code {
                401 => AttemptOutcome::NotRecognized,
                400 => AttemptOutcome::FrameInvalid,
                _ => AttemptOutcome::TransientFailure(
                    message.unwrap_or_else(|| format!("Service returned status {}", code)),
                ),
            }
        }
        Err(e) => AttemptOutcome::TransientFailure(e.to_string()),
    }
}

/// Best-effort message for a failed non-login call: the server's own words
/// when the body parses, a generic line otherwise.
fn failure_message(error: ureq::Error) -> String {
    match error {
        ureq::Error::Status(_, response) => {
            error_body_message(response).unwrap_or_else(|| GENERIC_FAILURE.to_string())
        }
        e => e.to_string(),
    }
}

fn error_body_message(response: ureq::Response) -> Option<String> {
    response
        .into_json::<MessageResponse>()
        .ok()
        .map(|body| body.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// One-shot HTTP stub: accepts a single connection and answers with the
    /// canned status and JSON body.
    fn stub_server(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 65536];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: String) -> HttpRecognitionClient {
        HttpRecognitionClient::new(&ServiceConfig {
            base_url,
            request_timeout_secs: 5,
        })
    }

    fn frame() -> EncodedFrame {
        EncodedFrame::from_jpeg_bytes(&[0xff, 0xd8])
    }

    #[test]
    fn matched_face_classifies_as_success() {
        let base = stub_server(
            "200 OK",
            r#"{"success": true, "message": "ok", "user": {"name": "Alice", "confidence": 97.0}}"#,
        );
        let outcome = client_for(base).login(&frame());
        match outcome {
            AttemptOutcome::Success(user) => {
                assert_eq!(user.name(), "Alice");
                assert_eq!(user.confidence(), 97.0);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn unauthorized_classifies_as_not_recognized() {
        let base = stub_server(
            "401 Unauthorized",
            r#"{"success": false, "message": "Face does not match any account."}"#,
        );
        assert_eq!(client_for(base).login(&frame()), AttemptOutcome::NotRecognized);
    }

    #[test]
    fn bad_request_classifies_as_frame_invalid() {
        let base = stub_server(
            "400 Bad Request",
            r#"{"success": false, "message": "No face detected."}"#,
        );
        assert_eq!(client_for(base).login(&frame()), AttemptOutcome::FrameInvalid);
    }

    #[test]
    fn server_error_carries_the_service_message() {
        let base = stub_server(
            "500 Internal Server Error",
            r#"{"success": false, "message": "Image processing error"}"#,
        );
        match client_for(base).login(&frame()) {
            AttemptOutcome::TransientFailure(detail) => {
                assert_eq!(detail, "Image processing error");
            }
            other => panic!("expected transient failure, got {:?}", other),
        }
    }

    #[test]
    fn unmapped_status_falls_through_to_transient() {
        let base = stub_server("404 Not Found", r#"{"success": false, "message": "No users yet."}"#);
        assert!(matches!(
            client_for(base).login(&frame()),
            AttemptOutcome::TransientFailure(_)
        ));
    }

    #[test]
    fn connection_failure_classifies_as_transient() {
        // Grab a port that nothing is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = client_for(format!("http://{}", addr)).login(&frame());
        assert!(matches!(outcome, AttemptOutcome::TransientFailure(_)));
    }

    #[test]
    fn malformed_success_body_classifies_as_transient() {
        let base = stub_server("200 OK", r#"{"success": true}"#);
        assert!(matches!(
            client_for(base).login(&frame()),
            AttemptOutcome::TransientFailure(_)
        ));
    }

    #[test]
    fn register_surfaces_the_server_message() {
        let base = stub_server(
            "200 OK",
            r#"{"success": true, "message": "Registered! Welcome Alice."}"#,
        );
        let message = client_for(base).register("Alice", &frame()).unwrap();
        assert_eq!(message, "Registered! Welcome Alice.");
    }

    #[test]
    fn register_failure_surfaces_the_server_message() {
        let base = stub_server(
            "400 Bad Request",
            r#"{"success": false, "message": "Multiple faces detected."}"#,
        );
        let err = client_for(base).register("Alice", &frame()).unwrap_err();
        assert!(err.to_string().contains("Multiple faces detected."));
    }
}
