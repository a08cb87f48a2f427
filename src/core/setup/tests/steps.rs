use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::core::config::{AGENT_ID, AGENT_NAME, API_DOMAIN, API_KEY, EVM_ADDRESS};
use crate::core::error::SetupError;
use crate::core::heartbeat::extract_tasks;
use crate::core::setup::steps;
use crate::core::setup::types::FailureReason;
use crate::core::setup::{SetupInputs, StepId, StepOutcome, run_steps, validate_endpoint};

use super::fixture;

#[test]
fn endpoint_validation() {
    assert_eq!(
        validate_endpoint(" https://api.clawfriend.ai/ ").unwrap(),
        "https://api.clawfriend.ai"
    );
    assert_eq!(
        validate_endpoint("http://localhost:8080").unwrap(),
        "http://localhost:8080"
    );
    for bad in ["not-a-url", "", "ftp://api.clawfriend.ai", "mailto:a@b.c"] {
        assert!(
            matches!(validate_endpoint(bad), Err(SetupError::Validation(_))),
            "{bad} should be rejected"
        );
    }
}

#[tokio::test]
async fn configure_endpoint_without_input_requires_existing_value() {
    let fx = fixture();
    let err = steps::configure_endpoint(&fx.ctx, &SetupInputs::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SetupError::Validation(_)));

    fx.ctx
        .config
        .set([(API_DOMAIN, "https://api.clawfriend.ai")])
        .await
        .unwrap();
    let outcome = steps::configure_endpoint(&fx.ctx, &SetupInputs::default())
        .await
        .unwrap();
    assert!(outcome.message().contains("already configured"));
}

#[tokio::test]
async fn configure_endpoint_keeps_matching_value() {
    let fx = fixture();
    let inputs = SetupInputs::new(Some("https://api.clawfriend.ai/".to_string()), None);

    let first = steps::configure_endpoint(&fx.ctx, &inputs).await.unwrap();
    assert!(first.message().starts_with("Endpoint set"));
    let second = steps::configure_endpoint(&fx.ctx, &inputs).await.unwrap();
    assert!(second.message().contains("already configured"));
    assert_eq!(
        fx.ctx.config.get(API_DOMAIN).await.unwrap().as_deref(),
        Some("https://api.clawfriend.ai")
    );
}

#[tokio::test]
async fn heartbeat_step_fails_without_template() {
    let fx = fixture();
    std::fs::remove_file(&fx.ctx.paths.template).unwrap();
    let err = steps::heartbeat_file(&fx.ctx).await.unwrap_err();
    assert!(matches!(err, SetupError::Validation(_)));
    assert!(!fx.ctx.paths.heartbeat.exists());
}

#[tokio::test]
async fn heartbeat_step_preserves_user_content_and_is_idempotent() {
    let fx = fixture();
    std::fs::create_dir_all(fx.ctx.paths.heartbeat.parent().unwrap()).unwrap();
    std::fs::write(
        &fx.ctx.paths.heartbeat,
        "# My heartbeat\n\n- [ ] Water the plants\n- [x] Check version (custom note)\n",
    )
    .unwrap();

    let first = steps::heartbeat_file(&fx.ctx).await.unwrap();
    let after_first = std::fs::read_to_string(&fx.ctx.paths.heartbeat).unwrap();
    assert!(after_first.starts_with("# My heartbeat\n"));
    assert!(after_first.contains("- [x] Check version (custom note)"));
    assert_eq!(
        after_first.matches("Check version").count(),
        1,
        "existing task must not be duplicated"
    );
    match first {
        StepOutcome::Done {
            data: Some(data), ..
        } => {
            assert_eq!(data["created"], false);
            assert!(data["added"].as_u64().unwrap() > 0);
        }
        other => panic!("expected done with data, got {:?}", other),
    }

    let second = steps::heartbeat_file(&fx.ctx).await.unwrap();
    let after_second = std::fs::read_to_string(&fx.ctx.paths.heartbeat).unwrap();
    assert_eq!(after_first, after_second);
    assert_eq!(second.message(), "Heartbeat tasks already up to date");

    let ids: Vec<_> = extract_tasks(&after_second)
        .into_iter()
        .map(|t| t.identifier)
        .collect();
    assert!(ids.contains(&"water the plants".to_string()));
}

async fn registration_fixture(server: &MockServer) -> super::Fixture {
    let fx = fixture();
    fx.ctx
        .config
        .set([(API_DOMAIN, server.uri())])
        .await
        .unwrap();
    fx
}

#[tokio::test]
async fn registration_creates_wallet_and_stores_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/agents/register"))
        .and(body_partial_json(json!({"name": "alpha"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "agent": {"id": "agent-9", "name": "alpha", "status": "pending"},
            "apiKey": "cf_live_abc",
            "claimUrl": "https://clawfriend.ai/claim/9"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fx = registration_fixture(&server).await;
    let inputs = SetupInputs::new(None, Some("alpha".to_string()));
    let outcome = steps::wallet_and_register(&fx.ctx, &inputs).await.unwrap();

    let address = fx.ctx.config.get(EVM_ADDRESS).await.unwrap().unwrap();
    assert!(address.starts_with("0x") && address.len() == 42);
    assert_eq!(
        fx.ctx.config.get(AGENT_NAME).await.unwrap().as_deref(),
        Some("alpha")
    );
    assert_eq!(
        fx.ctx.config.get(AGENT_ID).await.unwrap().as_deref(),
        Some("agent-9")
    );
    assert_eq!(
        fx.ctx.config.get(API_KEY).await.unwrap().as_deref(),
        Some("cf_live_abc")
    );
    match outcome {
        StepOutcome::Done {
            data: Some(data), ..
        } => {
            assert_eq!(data["walletCreated"], true);
            assert_eq!(data["walletAddress"], address.as_str());
            assert_eq!(data["claimUrl"], "https://clawfriend.ai/claim/9");
        }
        other => panic!("expected done with data, got {:?}", other),
    }
}

#[tokio::test]
async fn taken_name_fails_with_name_taken_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/agents/register"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"message": "Name alpha is taken"})),
        )
        .mount(&server)
        .await;

    let fx = registration_fixture(&server).await;
    let report = run_steps(
        fx.ctx.clone(),
        &[StepId::WalletAndRegister],
        &SetupInputs::new(None, Some("alpha".to_string())),
    )
    .await;

    match report.get(StepId::WalletAndRegister) {
        Some(StepOutcome::Failed { reason, message }) => {
            assert_eq!(*reason, FailureReason::NameTaken);
            assert!(message.contains("Name alpha is taken"));
        }
        other => panic!("expected name_taken failure, got {:?}", other),
    }
    let status = fx
        .ctx
        .state
        .snapshot()
        .await
        .unwrap()
        .step_status("wallet-and-register")
        .unwrap();
    assert_eq!(status.reason.as_deref(), Some("name_taken"));
    // The wallet survives a failed registration so a retry reuses it.
    assert!(fx.ctx.config.get(EVM_ADDRESS).await.unwrap().is_some());
}

#[tokio::test]
async fn valid_stored_key_skips_registration() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/agents/me"))
        .and(header("authorization", "Bearer cf_live_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "agent-9", "name": "alpha", "status": "pending"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/agents/register"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let fx = registration_fixture(&server).await;
    fx.ctx.config.set([(API_KEY, "cf_live_abc")]).await.unwrap();
    let outcome = steps::wallet_and_register(
        &fx.ctx,
        &SetupInputs::new(None, Some("alpha".to_string())),
    )
    .await
    .unwrap();
    assert_eq!(outcome.message(), "Already registered as alpha");
}

#[tokio::test]
async fn rejected_stored_key_registers_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/agents/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/agents/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "agent": {"id": 10, "name": "alpha", "status": "pending"},
            "apiKey": "cf_live_new"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fx = registration_fixture(&server).await;
    fx.ctx.config.set([(API_KEY, "cf_live_old")]).await.unwrap();
    steps::wallet_and_register(&fx.ctx, &SetupInputs::new(None, Some("alpha".to_string())))
        .await
        .unwrap();
    assert_eq!(
        fx.ctx.config.get(API_KEY).await.unwrap().as_deref(),
        Some("cf_live_new")
    );
    assert_eq!(
        fx.ctx.config.get(AGENT_ID).await.unwrap().as_deref(),
        Some("10")
    );
}
