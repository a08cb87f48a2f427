use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::core::config::{AGENT_NAME, API_DOMAIN, API_KEY};
use crate::core::scheduler::memory::MemoryTriggerClient;
use crate::core::setup::activation::{self, ActivationStatus, MONITOR_JOB_NAME, monitor_job};
use crate::core::state::{ACTIVATED_AT_FLAG, ACTIVATED_FLAG};

use super::{Fixture, fixture, fixture_with};

async fn registered(fx: &Fixture, server: &MockServer) {
    fx.ctx
        .config
        .set([
            (API_DOMAIN, server.uri()),
            (API_KEY, "cf_live_abc".to_string()),
            (AGENT_NAME, "alpha".to_string()),
        ])
        .await
        .unwrap();
}

async fn profile_status(server: &MockServer, status: &str) {
    Mock::given(method("GET"))
        .and(path("/v1/agents/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "agent-9", "name": "alpha", "status": status
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn install_is_noop_once_activated() {
    let fx = fixture();
    fx.ctx
        .state
        .update(|doc| doc.set_flag(ACTIVATED_FLAG, true))
        .await
        .unwrap();

    let outcome = activation::install(&fx.ctx).await.unwrap();
    assert!(outcome.success());
    assert_eq!(fx.triggers.create_calls(), 0);
}

#[tokio::test]
async fn install_schedules_monitor_once() {
    let fx = fixture();
    activation::install(&fx.ctx).await.unwrap();
    activation::install(&fx.ctx).await.unwrap();
    assert_eq!(fx.triggers.create_calls(), 1);
    assert_eq!(fx.triggers.job_names(), vec![MONITOR_JOB_NAME]);
}

#[tokio::test]
async fn check_without_api_key_reports_not_registered() {
    let fx = fixture();
    assert_eq!(
        activation::check(&fx.ctx).await.unwrap(),
        ActivationStatus::NotRegistered
    );
}

#[tokio::test]
async fn pending_agent_keeps_monitor() {
    let server = MockServer::start().await;
    profile_status(&server, "pending").await;
    let fx = fixture_with(MemoryTriggerClient::new().with_job(monitor_job()));
    registered(&fx, &server).await;

    assert_eq!(
        activation::check(&fx.ctx).await.unwrap(),
        ActivationStatus::Pending {
            status: "pending".to_string()
        }
    );
    assert_eq!(fx.triggers.job_names(), vec![MONITOR_JOB_NAME]);
    assert!(fx.triggers.notifications().is_empty());
    let doc = fx.ctx.state.snapshot().await.unwrap();
    assert!(!doc.bool_flag(ACTIVATED_FLAG));
}

#[tokio::test]
async fn activation_sets_flags_notifies_and_removes_monitor() {
    let server = MockServer::start().await;
    profile_status(&server, "active").await;
    let fx = fixture_with(MemoryTriggerClient::new().with_job(monitor_job()));
    registered(&fx, &server).await;

    assert_eq!(
        activation::check(&fx.ctx).await.unwrap(),
        ActivationStatus::Activated {
            name: "alpha".to_string()
        }
    );
    let doc = fx.ctx.state.snapshot().await.unwrap();
    assert!(doc.bool_flag(ACTIVATED_FLAG));
    assert!(doc.flag(ACTIVATED_AT_FLAG).is_some());

    let notes = fx.triggers.notifications();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].contains("alpha"));
    assert!(fx.triggers.job_names().is_empty());

    // A second run does not notify again.
    assert_eq!(
        activation::check(&fx.ctx).await.unwrap(),
        ActivationStatus::AlreadyActive
    );
    assert_eq!(fx.triggers.notifications().len(), 1);
}

#[tokio::test]
async fn already_active_clears_leftover_monitor() {
    let fx = fixture_with(MemoryTriggerClient::new().with_job(monitor_job()));
    fx.ctx
        .state
        .update(|doc| doc.set_flag(ACTIVATED_FLAG, true))
        .await
        .unwrap();

    assert_eq!(
        activation::check(&fx.ctx).await.unwrap(),
        ActivationStatus::AlreadyActive
    );
    assert!(fx.triggers.job_names().is_empty());
    assert!(fx.triggers.notifications().is_empty());
}
