use claims::assert_matches;
use claims::assert_ok;
use verify_sender::token_resolver::ResolveError;
use verify_sender::workflow::WorkflowError;
use verify_sender::workflow::WorkflowState;
use verify_sender::workflow::VERIFICATION_URL_PROMPT;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;
use crate::helpers::verify_link;
use crate::helpers::CannedConsole;
use crate::helpers::TestApp;

async fn mock_registration(
    app: &TestApp,
    status: u16,
) {
    Mock::given(path("/verified_senders"))
        .and(method("POST"))
        .and(header("Authorization", "Bearer SG.test-key"))
        .respond_with(ResponseTemplate::new(status).set_body_string(r#"{"id":1}"#))
        .named("Create sender")
        .expect(1)
        .mount(&app.api_server)
        .await;
}

async fn mock_verification(
    app: &TestApp,
    token: &str,
    status: u16,
    times: u64,
) {
    Mock::given(path(format!("/verified_senders/verify/{token}")))
        .and(method("GET"))
        .and(header("Authorization", "Bearer SG.test-key"))
        .respond_with(ResponseTemplate::new(status))
        .named("Verify sender")
        .expect(times)
        .mount(&app.api_server)
        .await;
}

#[tokio::test]
async fn happy_path() {
    let mut app = spawn_app().await;
    mock_registration(&app, 201).await;
    mock_verification(&app, "abc123", 200, 1).await;

    let mut console = CannedConsole::answering(&[verify_link("abc123").as_str()]);
    let report = assert_ok!(app.workflow.run(&mut console).await);

    assert!(report.verified());
    assert_eq!(report.registration.as_u16(), 201);
    assert_eq!(console.prompts, vec![VERIFICATION_URL_PROMPT]);
    assert_eq!(console.output(), "Sender verified.");
    assert_eq!(app.workflow.state(), WorkflowState::Done);
}

/// A rejected registration is reported, and the operator is still asked for
/// the link
#[tokio::test]
async fn failed_registration_is_not_fatal() {
    let mut app = spawn_app().await;
    mock_registration(&app, 500).await;
    mock_verification(&app, "abc123", 200, 1).await;

    let mut console = CannedConsole::answering(&[verify_link("abc123").as_str()]);
    let report = assert_ok!(app.workflow.run(&mut console).await);

    assert_eq!(report.registration.as_u16(), 500);
    assert_eq!(console.prompts, vec![VERIFICATION_URL_PROMPT]);
    assert_eq!(
        console.reports[0],
        "Failed to request sender verification. HTTP status code 500."
    );
    assert_eq!(console.reports[1], r#"{"id":1}"#);
    assert!(console.reports[2].contains("content-length"));
    assert_eq!(app.workflow.state(), WorkflowState::Done);
}

#[tokio::test]
async fn failed_verification_is_not_fatal() {
    let mut app = spawn_app().await;
    mock_registration(&app, 201).await;
    mock_verification(&app, "expired", 404, 1).await;

    let mut console = CannedConsole::answering(&[verify_link("expired").as_str()]);
    let report = assert_ok!(app.workflow.run(&mut console).await);

    assert!(!report.verified());
    assert!(console
        .output()
        .starts_with("Failed to verify sender. HTTP status code 404."));
    assert_eq!(app.workflow.state(), WorkflowState::Done);
}

/// Token resolution failure ends the run; the sender stays registered and
/// verification is never attempted
#[tokio::test]
async fn unresolvable_link_is_fatal() {
    let mut app = spawn_app().await;
    mock_registration(&app, 201).await;
    Mock::given(path("/track"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.link_server)
        .await;

    let link = format!("{}/track?id=1", app.link_server.uri());
    let mut console = CannedConsole::answering(&[link.as_str()]);
    let result = app.workflow.run(&mut console).await;

    assert_matches!(
        result,
        Err(WorkflowError::TokenResolution(ResolveError::TokenNotFound(_)))
    );
    assert_eq!(app.workflow.state(), WorkflowState::AwaitingInput);

    let requests = app.api_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "only the registration reached the API");
}

#[tokio::test]
async fn click_tracking_link_end_to_end() {
    let mut app = spawn_app().await;
    mock_registration(&app, 201).await;
    mock_verification(&app, "final001", 200, 1).await;
    Mock::given(path("/track"))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "Location",
            "https://app.sendgrid.com/settings/sender_auth/senders/verify?token=final001",
        ))
        .expect(1)
        .mount(&app.link_server)
        .await;

    let link = format!("{}/track?id=1", app.link_server.uri());
    let mut console = CannedConsole::answering(&[link.as_str()]);
    let report = assert_ok!(app.workflow.run(&mut console).await);

    assert!(report.verified());
}

/// End of input: an empty link resolves to nothing
#[tokio::test]
async fn no_input() {
    let mut app = spawn_app().await;
    mock_registration(&app, 201).await;

    let mut console = CannedConsole::default();
    let result = app.workflow.run(&mut console).await;

    assert_matches!(result, Err(WorkflowError::TokenResolution(_)));
}
