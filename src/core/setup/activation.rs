//! Activation monitoring: a periodic job that runs `clawfriend activation-check`
//! until the owner has claimed the agent, then announces it and removes itself.

use chrono::Utc;
use tracing::{info, warn};

use super::context::SetupContext;
use super::steps::scheduled_job_outcome;
use super::types::StepOutcome;
use crate::core::api::ApiClient;
use crate::core::config::{AGENT_NAME, API_DOMAIN, API_KEY};
use crate::core::error::{SetupError, SetupResult};
use crate::core::scheduler::{JobSpec, SessionMode, WakeMode, ensure_job};
use crate::core::state::{ACTIVATED_AT_FLAG, ACTIVATED_FLAG};

pub const MONITOR_JOB_NAME: &str = "clawfriend-activation-monitor";

pub fn monitor_job() -> JobSpec {
    JobSpec {
        name: MONITOR_JOB_NAME.to_string(),
        schedule: "*/5 * * * *".to_string(),
        payload: "Run `clawfriend activation-check` and relay its output to the owner if the \
                  agent became active."
            .to_string(),
        session: SessionMode::Isolated,
        wake: WakeMode::Now,
    }
}

pub async fn install(ctx: &SetupContext) -> SetupResult<StepOutcome> {
    if ctx.state.snapshot().await?.bool_flag(ACTIVATED_FLAG) {
        return Ok(StepOutcome::done(
            "Agent is already active; no monitor needed",
        ));
    }
    let job = monitor_job();
    let outcome = ensure_job(ctx.triggers.as_ref(), &job).await;
    scheduled_job_outcome(outcome, &job.name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationStatus {
    NotRegistered,
    Pending { status: String },
    Activated { name: String },
    AlreadyActive,
}

pub async fn check(ctx: &SetupContext) -> SetupResult<ActivationStatus> {
    if ctx.state.snapshot().await?.bool_flag(ACTIVATED_FLAG) {
        // Leftover monitor from an earlier run.
        if ctx.triggers.exists(MONITOR_JOB_NAME).await
            && !ctx.triggers.remove(MONITOR_JOB_NAME).await
        {
            warn!("could not remove job '{}'", MONITOR_JOB_NAME);
        }
        return Ok(ActivationStatus::AlreadyActive);
    }

    let Some(api_key) = ctx.config.get(API_KEY).await? else {
        return Ok(ActivationStatus::NotRegistered);
    };
    let endpoint = ctx
        .config
        .get(API_DOMAIN)
        .await?
        .ok_or_else(|| SetupError::Validation("API endpoint is not configured".to_string()))?;

    let profile = ApiClient::new(&endpoint)?.me(&api_key).await?;
    if !profile.is_active() {
        return Ok(ActivationStatus::Pending {
            status: profile.status,
        });
    }

    let name = if profile.name.is_empty() {
        ctx.config.get_or(AGENT_NAME, "your agent").await?
    } else {
        profile.name.clone()
    };

    ctx.state
        .update(|doc| {
            doc.set_flag(ACTIVATED_FLAG, true);
            doc.set_flag(ACTIVATED_AT_FLAG, Utc::now().to_rfc3339());
        })
        .await?;
    info!("agent {} is active", name);

    if !ctx
        .triggers
        .notify(&format!(
            "ClawFriend agent {} is now active and can post, like and trade shares.",
            name
        ))
        .await
    {
        warn!("activation notification could not be delivered");
    }
    if !ctx.triggers.remove(MONITOR_JOB_NAME).await {
        warn!("could not remove job '{}'", MONITOR_JOB_NAME);
    }

    Ok(ActivationStatus::Activated { name })
}
