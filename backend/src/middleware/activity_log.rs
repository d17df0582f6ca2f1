//! Best-effort request activity log.
//!
//! Every request yields one [`ActivityRecord`] written to a JSON-lines file,
//! to the `activity_logs` table and to `tracing`. Requests whose inner service
//! fails are recorded with the error's status code. Sink writes run off the
//! worker thread; failures are logged at `warn` and never alter the response.
//!
//! Request bodies are captured only for JSON payloads whose declared length
//! is at most [`MAX_LOGGED_BODY_BYTES`]; any key containing `password` is
//! replaced with `"[REDACTED]"`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{Error, HttpMessage, HttpRequest, web};
use cap_std::{ambient_authority, fs::Dir, fs::OpenOptions};
use chrono::Utc;
use futures_util::StreamExt;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::ports::{ActivityLogRepository, ActivityRecord};
use crate::domain::{STATIC_BRIDGING_NAME, STATIC_BRIDGING_USER_ID, TraceId, UserId};
use crate::inbound::http::session::{SessionTransport, session_token};

/// Largest request body, in bytes, copied into an activity record.
pub const MAX_LOGGED_BODY_BYTES: usize = 8 * 1024;

const REDACTED: &str = "[REDACTED]";

/// Replace every value whose key mentions `password`, at any depth.
///
/// # Examples
/// ```
/// use glucose_backend::middleware::activity_log::redact_passwords;
/// use serde_json::json;
///
/// let mut body = json!({"email": "a@b.co", "password": "hunter2"});
/// redact_passwords(&mut body);
/// assert_eq!(body["password"], "[REDACTED]");
/// ```
pub fn redact_passwords(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if key.to_ascii_lowercase().contains("password") {
                    *entry = Value::String(REDACTED.to_owned());
                } else {
                    redact_passwords(entry);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_passwords),
        _ => {}
    }
}

/// Append-only JSON-lines file opened through a capability directory.
pub struct ActivityFile {
    dir: Dir,
    name: PathBuf,
    guard: Mutex<()>,
}

impl ActivityFile {
    /// Create the parent directory if needed; the file is created on first
    /// write.
    pub fn open(path: &Path) -> io::Result<Self> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "activity log path must name a file",
            )
        })?;
        Dir::create_ambient_dir_all(parent, ambient_authority())?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
        Ok(Self {
            dir,
            name: PathBuf::from(name),
            guard: Mutex::new(()),
        })
    }

    fn append(&self, record: &ActivityRecord) -> io::Result<()> {
        let mut line = serde_json::to_vec(record).map_err(io::Error::other)?;
        line.push(b'\n');
        let _guard = self
            .guard
            .lock()
            .map_err(|_| io::Error::other("activity log file lock poisoned"))?;
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        let mut file = self.dir.open_with(&self.name, &options)?;
        file.write_all(&line)
    }
}

/// Destinations for activity records.
pub struct ActivitySink {
    file: Option<Arc<ActivityFile>>,
    repository: Arc<dyn ActivityLogRepository>,
}

impl ActivitySink {
    pub fn new(repository: Arc<dyn ActivityLogRepository>) -> Self {
        Self {
            file: None,
            repository,
        }
    }

    #[must_use]
    pub fn with_file(mut self, file: ActivityFile) -> Self {
        self.file = Some(Arc::new(file));
        self
    }

    fn submit(&self, record: ActivityRecord) {
        info!(
            method = %record.method,
            endpoint = %record.endpoint,
            status = record.status_code,
            user_id = record.user_id.map(UserId::get),
            "request completed"
        );
        let file = self.file.clone();
        let repository = Arc::clone(&self.repository);
        let write = async move {
            if let Some(file) = file {
                let line = record.clone();
                match tokio::task::spawn_blocking(move || file.append(&line)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(error)) => warn!(%error, "activity log file write failed"),
                    Err(error) => warn!(%error, "activity log file task failed"),
                }
            }
            if let Err(error) = repository.record(&record).await {
                warn!(%error, endpoint = %record.endpoint, "activity log write failed");
            }
        };
        match TraceId::current() {
            Some(trace_id) => {
                tokio::spawn(TraceId::scope(trace_id, write));
            }
            None => {
                tokio::spawn(write);
            }
        }
    }
}

/// Middleware recording one [`ActivityRecord`] per request.
///
/// # Examples
/// ```ignore
/// App::new().wrap(ActivityLog::new(sink, state.session.clone()))
/// ```
#[derive(Clone)]
pub struct ActivityLog {
    sink: Arc<ActivitySink>,
    session: SessionTransport,
}

impl ActivityLog {
    /// `session` resolves the caller's identity from the request token.
    pub fn new(sink: Arc<ActivitySink>, session: SessionTransport) -> Self {
        Self { sink, session }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ActivityLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ActivityLogMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ActivityLogMiddleware {
            service: Rc::new(service),
            sink: Arc::clone(&self.sink),
            session: self.session.clone(),
        }))
    }
}

/// Service wrapper produced by [`ActivityLog`].
pub struct ActivityLogMiddleware<S> {
    service: Rc<S>,
    sink: Arc<ActivitySink>,
    session: SessionTransport,
}

fn identify(session: &SessionTransport, req: &HttpRequest) -> Option<(UserId, String)> {
    if session.is_static_bridging(req) {
        return Some((
            UserId::new(STATIC_BRIDGING_USER_ID),
            STATIC_BRIDGING_NAME.to_owned(),
        ));
    }
    let token = session_token(req).ok()?;
    let claims = session.tokens().verify(&token).ok()?;
    Some((claims.user_id(), claims.name().to_owned()))
}

fn header_text(req: &ServiceRequest, name: header::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Buffer a small JSON body, put it back for the handler and return the
/// redacted copy.
async fn capture_body(req: &mut ServiceRequest) -> Option<Value> {
    let declared = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok())?;
    if declared == 0 || declared > MAX_LOGGED_BODY_BYTES || req.content_type() != "application/json"
    {
        return None;
    }

    let mut payload = req.take_payload();
    let mut bytes = web::BytesMut::with_capacity(declared);
    let mut complete = true;
    while let Some(chunk) = payload.next().await {
        match chunk {
            Ok(chunk) => bytes.extend_from_slice(&chunk),
            Err(error) => {
                warn!(%error, "failed to buffer request body for activity log");
                complete = false;
                break;
            }
        }
    }
    let bytes = bytes.freeze();
    req.set_payload(Payload::from(bytes.clone()));

    if !complete || bytes.len() > MAX_LOGGED_BODY_BYTES {
        return None;
    }
    let mut body: Value = serde_json::from_slice(&bytes).ok()?;
    redact_passwords(&mut body);
    Some(body)
}

impl<S, B> Service<ServiceRequest> for ActivityLogMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let sink = Arc::clone(&self.sink);
        let session = self.session.clone();
        Box::pin(async move {
            let request_body = capture_body(&mut req).await;
            let identity = identify(&session, req.request());
            let method = req.method().to_string();
            let endpoint = req
                .uri()
                .path_and_query()
                .map_or_else(|| req.path().to_owned(), |pq| pq.as_str().to_owned());
            let ip_address = req
                .connection_info()
                .realip_remote_addr()
                .map(str::to_owned);
            let user_agent = header_text(&req, header::USER_AGENT);

            let result = service.call(req).await;
            let status_code = match &result {
                Ok(res) => res.status(),
                Err(error) => error.as_response_error().status_code(),
            };

            let (user_id, name) = match identity {
                Some((id, name)) => (Some(id), Some(name)),
                None => (None, None),
            };
            sink.submit(ActivityRecord {
                user_id,
                name,
                method,
                endpoint,
                request_body,
                ip_address,
                status_code: status_code.as_u16(),
                user_agent,
                created_at: Utc::now(),
            });
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::configure;
    use crate::inbound::http::test_utils::{TestHarness, harness};
    use crate::test_support::RecordingActivityLog;
    use crate::test_support::cap_fs::read_file_to_string;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test};
    use rstest::rstest;
    use serde_json::json;
    use std::time::Duration;

    async fn settled(log: &RecordingActivityLog, count: usize) -> Vec<ActivityRecord> {
        for _ in 0..100 {
            let entries = log.entries();
            if entries.len() >= count {
                return entries;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        log.entries()
    }

    async fn file_lines(path: &Path, count: usize) -> Vec<Value> {
        for _ in 0..100 {
            let lines: Vec<Value> = read_file_to_string(path)
                .map(|contents| {
                    contents
                        .lines()
                        .map(|line| serde_json::from_str(line).expect("json line"))
                        .collect()
                })
                .unwrap_or_default();
            if lines.len() >= count {
                return lines;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("activity file never reached {count} lines");
    }

    async fn echo_len(body: web::Bytes) -> HttpResponse {
        HttpResponse::Ok().body(body.len().to_string())
    }

    async fn call(
        harness: &TestHarness,
        sink: ActivitySink,
        req: actix_test::TestRequest,
    ) -> (StatusCode, web::Bytes) {
        let state = harness.state();
        let app = actix_test::init_service(
            App::new()
                .app_data(state.clone())
                .wrap(ActivityLog::new(Arc::new(sink), state.session.clone()))
                .configure(configure)
                .route("/echo", web::post().to(echo_len)),
        )
        .await;
        let res = actix_test::call_service(&app, req.to_request()).await;
        let status = res.status();
        (status, actix_test::read_body(res).await)
    }

    #[rstest]
    fn redaction_reaches_nested_keys() {
        let mut body = json!({
            "user": {"newPassword": "a", "name": "Ani"},
            "items": [{"password_confirmation": "b"}],
        });
        redact_passwords(&mut body);
        assert_eq!(body["user"]["newPassword"], REDACTED);
        assert_eq!(body["user"]["name"], "Ani");
        assert_eq!(body["items"][0]["password_confirmation"], REDACTED);
    }

    #[rstest]
    #[actix_web::test]
    async fn records_anonymous_login_with_redacted_password(harness: TestHarness) {
        harness
            .store
            .add_user("Ani", "ani@example.com", "secret1", Some(2));
        let sink = ActivitySink::new(harness.activity.clone());
        let req = actix_test::TestRequest::post()
            .uri("/auth/login")
            .insert_header((header::USER_AGENT, "glucose-tests"))
            .set_json(json!({ "email": "ani@example.com", "password": "secret1" }));
        let (status, _) = call(&harness, sink, req).await;
        assert_eq!(status, StatusCode::OK);

        let entries = settled(&harness.activity, 1).await;
        let entry = entries.first().expect("activity record");
        assert_eq!(entry.method, "POST");
        assert_eq!(entry.endpoint, "/auth/login");
        assert_eq!(entry.status_code, 200);
        assert_eq!(entry.user_id, None);
        assert_eq!(entry.user_agent.as_deref(), Some("glucose-tests"));
        let body = entry.request_body.as_ref().expect("captured body");
        assert_eq!(body["email"], "ani@example.com");
        assert_eq!(body["password"], REDACTED);
    }

    #[rstest]
    #[actix_web::test]
    async fn records_the_authenticated_user(harness: TestHarness) {
        let (profile, token) = harness.user_with_role(3);
        let sink = ActivitySink::new(harness.activity.clone());
        let req = actix_test::TestRequest::get()
            .uri("/api/test-glucosa?page=2")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")));
        let (status, _) = call(&harness, sink, req).await;
        assert_eq!(status, StatusCode::OK);

        let entries = settled(&harness.activity, 1).await;
        let entry = entries.first().expect("activity record");
        assert_eq!(entry.user_id, Some(profile.id));
        assert_eq!(entry.name.as_deref(), Some(profile.name.as_str()));
        assert_eq!(entry.endpoint, "/api/test-glucosa?page=2");
        assert!(entry.request_body.is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn records_the_partner_principal(harness: TestHarness) {
        let sink = ActivitySink::new(harness.activity.clone());
        let req = actix_test::TestRequest::get()
            .uri("/api/v1/bridging/glucose-test")
            .insert_header((header::AUTHORIZATION, harness.static_authorization()));
        call(&harness, sink, req).await;

        let entries = settled(&harness.activity, 1).await;
        let entry = entries.first().expect("activity record");
        assert_eq!(entry.user_id, Some(UserId::new(STATIC_BRIDGING_USER_ID)));
        assert_eq!(entry.name.as_deref(), Some(STATIC_BRIDGING_NAME));
    }

    #[rstest]
    #[actix_web::test]
    async fn oversized_body_is_skipped_but_delivered(harness: TestHarness) {
        let sink = ActivitySink::new(harness.activity.clone());
        let large = json!({ "note": "x".repeat(MAX_LOGGED_BODY_BYTES) });
        let expected_len = serde_json::to_vec(&large).expect("encode").len();
        let req = actix_test::TestRequest::post().uri("/echo").set_json(large);
        let (status, body) = call(&harness, sink, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, expected_len.to_string());
        let entries = settled(&harness.activity, 1).await;
        assert!(entries.first().expect("record").request_body.is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn small_body_is_captured_and_still_delivered(harness: TestHarness) {
        let sink = ActivitySink::new(harness.activity.clone());
        let payload = json!({ "note": "fasting" });
        let expected_len = serde_json::to_vec(&payload).expect("encode").len();
        let req = actix_test::TestRequest::post().uri("/echo").set_json(payload);
        let (_, body) = call(&harness, sink, req).await;

        assert_eq!(body, expected_len.to_string());
        let entries = settled(&harness.activity, 1).await;
        let captured = entries.first().and_then(|e| e.request_body.clone());
        assert_eq!(captured, Some(json!({ "note": "fasting" })));
    }

    #[rstest]
    #[actix_web::test]
    async fn sink_failure_leaves_response_untouched(harness: TestHarness) {
        harness.activity.set_failing(true);
        let sink = ActivitySink::new(harness.activity.clone());
        let req = actix_test::TestRequest::post().uri("/auth/logout");
        let (status, _) = call(&harness, sink, req).await;
        assert_eq!(status, StatusCode::OK);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(harness.activity.entries().is_empty());
    }

    #[rstest]
    #[actix_web::test]
    async fn file_sink_appends_json_lines(harness: TestHarness) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logs").join("activity.log");
        let sink = ActivitySink::new(harness.activity.clone())
            .with_file(ActivityFile::open(&path).expect("open activity file"));
        let state = harness.state();
        let app = actix_test::init_service(
            App::new()
                .app_data(state.clone())
                .wrap(ActivityLog::new(Arc::new(sink), state.session.clone()))
                .configure(configure),
        )
        .await;
        for _ in 0..2 {
            let req = actix_test::TestRequest::post().uri("/auth/logout").to_request();
            actix_test::call_service(&app, req).await;
        }

        let lines = file_lines(&path, 2).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["endpoint"], "/auth/logout");
        assert_eq!(lines[1]["status_code"], 200);
    }

    #[rstest]
    #[actix_web::test]
    async fn failing_inner_service_is_still_recorded(harness: TestHarness) {
        let sink = ActivitySink::new(harness.activity.clone());
        let state = harness.state();
        let app = actix_test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(configure)
                .wrap_fn(|_req, _srv| {
                    ready(Err::<ServiceResponse, Error>(
                        actix_web::error::ErrorForbidden("blocked upstream"),
                    ))
                })
                .wrap(ActivityLog::new(Arc::new(sink), state.session.clone())),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/api/test-glucosa")
            .to_request();
        let result = actix_test::try_call_service(&app, req).await;
        assert!(result.is_err(), "inner error must reach the caller");

        let entries = settled(&harness.activity, 1).await;
        let entry = entries.first().expect("activity record");
        assert_eq!(entry.endpoint, "/api/test-glucosa");
        assert_eq!(entry.status_code, 403);
    }
}
