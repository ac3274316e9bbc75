use std::net::TcpListener;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use vidqa_gateway::{
    Answer, FailureKind, Gateway, GatewaySettings, IngestAck, ReqwestGateway, UNREACHABLE_MESSAGE,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOCATOR: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

fn gateway_for(server: &MockServer) -> ReqwestGateway {
    ReqwestGateway::new(GatewaySettings {
        base_url: server.uri(),
        ..GatewaySettings::default()
    })
    .expect("gateway")
}

#[tokio::test]
async fn submit_video_posts_locator_and_reads_ack() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process-video"))
        .and(body_json(json!({ "video_url": LOCATOR })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Video processed successfully",
            "video_id": "dQw4w9WgXcQ",
            "chunks_created": 7,
            "transcript_length": 3120
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = gateway_for(&server).submit_video(LOCATOR).await.expect("ack");
    assert_eq!(
        ack,
        IngestAck {
            message: Some("Video processed successfully".to_string()),
            video_id: Some("dQw4w9WgXcQ".to_string()),
            chunks_created: Some(7),
            transcript_length: Some(3120),
        }
    );
}

#[tokio::test]
async fn submit_video_accepts_any_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process-video"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let ack = gateway_for(&server).submit_video(LOCATOR).await.expect("ack");
    assert_eq!(ack, IngestAck::default());
}

#[tokio::test]
async fn rejection_uses_service_detail_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process-video"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "Transcript is empty" })),
        )
        .mount(&server)
        .await;

    let err = gateway_for(&server)
        .submit_video(LOCATOR)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Rejected { status: 400 });
    assert_eq!(err.message, "Transcript is empty");
}

#[tokio::test]
async fn structured_detail_is_rendered_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{ "loc": ["body", "question"], "msg": "field required" }]
        })))
        .mount(&server)
        .await;

    let err = gateway_for(&server)
        .submit_question(LOCATOR, "?")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Rejected { status: 422 });
    assert_eq!(
        err.message,
        r#"[{"loc":["body","question"],"msg":"field required"}]"#
    );
}

#[tokio::test]
async fn rejection_without_detail_falls_back_to_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = gateway_for(&server)
        .submit_question(LOCATOR, "What?")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Rejected { status: 502 });
    assert_eq!(err.message, UNREACHABLE_MESSAGE);
}

#[tokio::test]
async fn submit_question_returns_answer_and_sources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_json(json!({ "video_url": LOCATOR, "question": "Who sings?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Rick Astley.",
            "relevant_chunks": ["never gonna give you up", "never gonna let you down"]
        })))
        .mount(&server)
        .await;

    let answer = gateway_for(&server)
        .submit_question(LOCATOR, "Who sings?")
        .await
        .expect("answer");
    assert_eq!(
        answer,
        Answer {
            text: "Rick Astley.".to_string(),
            sources: vec![
                "never gonna give you up".to_string(),
                "never gonna let you down".to_string()
            ],
        }
    );
}

#[tokio::test]
async fn malformed_answer_body_is_a_generic_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "wrong shape" })))
        .mount(&server)
        .await;

    let err = gateway_for(&server)
        .submit_question(LOCATOR, "What?")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::MalformedBody);
    assert_eq!(err.message, UNREACHABLE_MESSAGE);
}

#[tokio::test]
async fn unreachable_service_maps_to_generic_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let gateway = ReqwestGateway::new(GatewaySettings {
        base_url: format!("http://127.0.0.1:{port}"),
        ..GatewaySettings::default()
    })
    .unwrap();

    let err = gateway.submit_video(LOCATOR).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Unreachable);
    assert_eq!(err.message, UNREACHABLE_MESSAGE);
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({ "answer": "late", "relevant_chunks": [] })),
        )
        .mount(&server)
        .await;

    let gateway = ReqwestGateway::new(GatewaySettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..GatewaySettings::default()
    })
    .unwrap();

    let err = gateway.submit_question(LOCATOR, "?").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
    assert_eq!(err.message, UNREACHABLE_MESSAGE);
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "qdrant": "connected"
        })))
        .mount(&server)
        .await;

    let gateway = ReqwestGateway::new(GatewaySettings {
        base_url: format!("{}/api/", server.uri()),
        ..GatewaySettings::default()
    })
    .unwrap();

    let health = gateway.health().await.expect("health");
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn delete_video_hits_video_resource() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/video/dQw4w9WgXcQ"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": "Video dQw4w9WgXcQ deleted successfully" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    gateway_for(&server)
        .delete_video("dQw4w9WgXcQ")
        .await
        .expect("deleted");
}

#[test]
fn invalid_base_url_is_rejected() {
    for base_url in ["not a url", "ftp://example.com", "mailto:someone@example.com"] {
        let err = ReqwestGateway::new(GatewaySettings {
            base_url: base_url.to_string(),
            ..GatewaySettings::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidBaseUrl, "base {base_url}");
    }
}
