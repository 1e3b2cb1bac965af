use super::*;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use shared::domain::UNAVAILABLE;
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

use crate::error::{NETWORK_RETRY_MESSAGE, SERVER_FALLBACK_MESSAGE};

#[derive(Debug)]
struct ReceivedUpload {
    field: String,
    filename: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct ServerReply {
    status: StatusCode,
    headers: Vec<(&'static str, String)>,
    body: Vec<u8>,
}

impl ServerReply {
    fn report(headers: Vec<(&'static str, String)>) -> Self {
        let mut all = vec![(
            "content-type",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
        )];
        all.extend(headers);
        Self {
            status: StatusCode::OK,
            headers: all,
            body: b"PK\x03\x04report".to_vec(),
        }
    }

    fn failure(status: StatusCode, content_type: &str, body: &[u8]) -> Self {
        Self {
            status,
            headers: vec![("content-type", content_type.to_string())],
            body: body.to_vec(),
        }
    }
}

#[derive(Clone)]
struct ServerState {
    reply: ServerReply,
    tx: Arc<Mutex<Option<oneshot::Sender<Vec<ReceivedUpload>>>>>,
}

async fn handle_upload(State(state): State<ServerState>, mut multipart: Multipart) -> Response {
    let mut received = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.unwrap_or_default();
        received.push(ReceivedUpload {
            field: name,
            filename,
            bytes: bytes.to_vec(),
        });
    }
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(received);
    }

    let mut response = (state.reply.status, state.reply.body.clone()).into_response();
    for (name, value) in &state.reply.headers {
        response.headers_mut().insert(
            HeaderName::from_static(*name),
            HeaderValue::from_str(value).expect("header value"),
        );
    }
    response
}

async fn spawn_report_server(
    reply: ServerReply,
) -> anyhow::Result<(String, oneshot::Receiver<Vec<ReceivedUpload>>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    let state = ServerState {
        reply,
        tx: Arc::new(Mutex::new(Some(tx))),
    };
    let app = Router::new()
        .route("/upload", post(handle_upload))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), rx))
}

async fn unreachable_server_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

fn domains_file() -> SelectedFile {
    SelectedFile::new("domains.txt", b"example.com\nexample.org\n".to_vec())
}

fn summary_headers() -> Vec<(&'static str, String)> {
    vec![
        ("x-total-domains", "100".to_string()),
        ("x-working-domains", "80".to_string()),
        ("x-not-working-domains", "15".to_string()),
        ("x-need-check-domains", "5".to_string()),
    ]
}

#[test]
fn upload_endpoint_appends_upload_path() {
    assert_eq!(
        upload_endpoint("http://127.0.0.1:5000").expect("url").as_str(),
        "http://127.0.0.1:5000/upload"
    );
    assert_eq!(
        upload_endpoint("https://reports.example.com/tools/").expect("url").as_str(),
        "https://reports.example.com/tools/upload"
    );
    assert_eq!(
        upload_endpoint(" http://host:8080/?x=1 ").expect("url").as_str(),
        "http://host:8080/upload"
    );
}

#[test]
fn upload_endpoint_rejects_non_http_urls() {
    assert!(upload_endpoint("ftp://host/").is_err());
    assert!(upload_endpoint("not a url").is_err());
}

#[tokio::test]
async fn http_transport_sends_file_as_multipart_field() {
    let (server_url, received_rx) = spawn_report_server(ServerReply::report(summary_headers()))
        .await
        .expect("spawn server");
    let transport = HttpUploadTransport::new(&server_url).expect("transport");

    let response = transport.upload(&domains_file()).await.expect("upload");
    assert_eq!(response.status, 200);
    assert_eq!(response.header("X-Total-Domains"), Some("100"));
    assert_eq!(response.body, b"PK\x03\x04report");

    let received = received_rx.await.expect("received");
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].field, "file");
    assert_eq!(received[0].filename.as_deref(), Some("domains.txt"));
    assert_eq!(received[0].bytes, b"example.com\nexample.org\n");
}

#[tokio::test]
async fn http_transport_reports_unreachable_server_as_transport_error() {
    let transport = HttpUploadTransport::new(&unreachable_server_url().await).expect("transport");
    let err = transport
        .upload(&domains_file())
        .await
        .expect_err("must fail");
    assert!(!err.message().is_empty());
}

#[tokio::test]
async fn successful_upload_shows_reported_summary() {
    let (server_url, _received_rx) = spawn_report_server(ServerReply::report(summary_headers()))
        .await
        .expect("spawn server");
    let controller =
        UploadController::new(HttpUploadTransport::new(&server_url).expect("transport"));
    controller.select_file(Some(domains_file())).await;

    let result = match controller.submit().await.expect("submit") {
        SubmitOutcome::Completed(result) => result,
        other => panic!("unexpected outcome: {other:?}"),
    };

    let values: Vec<String> = result
        .summary
        .display_rows()
        .into_iter()
        .map(|(_, value)| value)
        .collect();
    assert_eq!(values, vec!["100", "80", "15", "5"]);
    assert_eq!(result.artifact.filename, "domain_report.xlsx");

    let view = controller.snapshot().await;
    assert_eq!(view.phase, UploadPhase::Completed);
    assert_eq!(view.result.as_ref(), Some(&result));
    assert!(view.progress.is_none());
    assert_eq!(view.error, None);
    assert_eq!(controller.timer_counts().await.total(), 0);

    let notification = controller.notification().await.expect("toast");
    assert_eq!(notification.kind, NotificationKind::Success);

    let bytes = controller
        .artifact_bytes(&result.artifact.url)
        .await
        .expect("artifact");
    assert_eq!(bytes.as_slice(), b"PK\x03\x04report");
}

#[tokio::test]
async fn successful_upload_without_metadata_shows_unavailable_counts() {
    let (server_url, _received_rx) = spawn_report_server(ServerReply::report(Vec::new()))
        .await
        .expect("spawn server");
    let controller =
        UploadController::new(HttpUploadTransport::new(&server_url).expect("transport"));
    controller.select_file(Some(domains_file())).await;

    controller.submit().await.expect("submit");
    let view = controller.snapshot().await;
    let result = view.result.expect("result panel");
    for (_, value) in result.summary.display_rows() {
        assert_eq!(value, UNAVAILABLE);
    }
}

#[tokio::test]
async fn json_server_error_message_is_shown_inline() {
    let (server_url, _received_rx) = spawn_report_server(ServerReply::failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        "application/json",
        br#"{"error":"bad format"}"#,
    ))
    .await
    .expect("spawn server");
    let controller =
        UploadController::new(HttpUploadTransport::new(&server_url).expect("transport"));
    controller.select_file(Some(domains_file())).await;

    let err = controller.submit().await.expect_err("must fail");
    assert!(matches!(err, UploadError::Server { status: 500, .. }));

    let view = controller.snapshot().await;
    assert_eq!(view.error.as_deref(), Some("bad format"));
    assert_eq!(view.phase, UploadPhase::Failed);
    assert!(view.progress.is_none());
    assert!(view.result.is_none());

    let notification = controller.notification().await.expect("toast");
    assert_eq!(notification.kind, NotificationKind::Error);
    assert_eq!(notification.message, "bad format");
}

#[tokio::test]
async fn non_json_server_error_uses_fallback_text() {
    let (server_url, _received_rx) = spawn_report_server(ServerReply::failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        "text/html; charset=utf-8",
        b"<h1>Internal Server Error</h1>",
    ))
    .await
    .expect("spawn server");
    let controller =
        UploadController::new(HttpUploadTransport::new(&server_url).expect("transport"));
    controller.select_file(Some(domains_file())).await;

    controller.submit().await.expect_err("must fail");
    let view = controller.snapshot().await;
    assert_eq!(view.error.as_deref(), Some(SERVER_FALLBACK_MESSAGE));
}

#[tokio::test]
async fn unreachable_server_surfaces_network_error() {
    let controller = UploadController::new(
        HttpUploadTransport::new(&unreachable_server_url().await).expect("transport"),
    );
    controller.select_file(Some(domains_file())).await;

    let err = controller.submit().await.expect_err("must fail");
    assert!(matches!(err, UploadError::Network(_)));

    let view = controller.snapshot().await;
    assert_eq!(view.error.as_deref(), Some(NETWORK_RETRY_MESSAGE));
    assert_eq!(view.phase, UploadPhase::Failed);
    assert!(view.progress.is_none());
    assert!(view.submit_enabled);
    assert_eq!(controller.timer_counts().await.total(), 0);
}

#[tokio::test]
async fn save_artifact_writes_report_to_disk() {
    let (server_url, _received_rx) = spawn_report_server(ServerReply::report(Vec::new()))
        .await
        .expect("spawn server");
    let controller =
        UploadController::new(HttpUploadTransport::new(&server_url).expect("transport"));
    controller.select_file(Some(domains_file())).await;
    let SubmitOutcome::Completed(result) = controller.submit().await.expect("submit") else {
        panic!("expected completed upload");
    };

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(&result.artifact.filename);
    let written = controller
        .save_artifact(&result.artifact.url, &path)
        .await
        .expect("save");
    assert_eq!(written, result.artifact.size_bytes);
    assert_eq!(
        std::fs::read(&path).expect("read back"),
        b"PK\x03\x04report"
    );

    controller.reset().await;
    assert!(controller
        .save_artifact(&result.artifact.url, &path)
        .await
        .is_err());
}
