use claims::assert_matches;
use verify_sender::configuration::load_settings;
use verify_sender::configuration::ConfigurationError;
use verify_sender::configuration::Environment;
use wiremock::MockServer;

/// No key in any source: startup fails before anything reaches the API
#[tokio::test]
async fn missing_credential_makes_no_requests() {
    let api_server = MockServer::start().await;
    let cfg_dir =
        std::env::temp_dir().join(format!("verify-sender-none-{}", rand::random::<u64>()));

    let result = load_settings(&cfg_dir, &Environment::Local, None);
    assert_matches!(result, Err(ConfigurationError::MissingCredential));
    assert_eq!(
        result.unwrap_err().to_string(),
        "SendGrid API Key not configured."
    );

    assert!(api_server.received_requests().await.unwrap().is_empty());
}
