use serde_json::json;
use tracing::{info, warn};
use url::Url;

use super::activation;
use super::context::SetupContext;
use super::types::{SetupInputs, StepOutcome};
use crate::core::api::{ApiClient, ApiError, RegistrationRequest};
use crate::core::config::{AGENT_ID, AGENT_NAME, API_DOMAIN, API_KEY};
use crate::core::error::{SetupError, SetupResult};
use crate::core::heartbeat::{merge_tasks, template_task_section};
use crate::core::scheduler::{EnsureOutcome, ensure_job, heartbeat_job};
use crate::core::wallet::{ensure_wallet, registration_message};

/// Accepts absolute `http`/`https` URLs with a host and returns them without
/// a trailing slash.
pub fn validate_endpoint(raw: &str) -> SetupResult<String> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| SetupError::Validation(format!("'{}' is not a valid URL: {}", trimmed, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SetupError::Validation(format!("'{}' must use http or https", trimmed)));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(SetupError::Validation(format!("'{}' has no host", trimmed)));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

pub async fn configure_endpoint(
    ctx: &SetupContext,
    inputs: &SetupInputs,
) -> SetupResult<StepOutcome> {
    let configured = ctx.config.get(API_DOMAIN).await?;

    let Some(requested) = inputs.endpoint.as_deref() else {
        return match configured {
            Some(current) => {
                validate_endpoint(&current)?;
                Ok(StepOutcome::done(format!("Endpoint already configured: {}", current)))
            }
            None => Err(SetupError::Validation(
                "No API endpoint configured; pass one to quick-setup or run-steps".to_string(),
            )),
        };
    };

    let endpoint = validate_endpoint(requested)?;
    if configured.as_deref() == Some(endpoint.as_str()) {
        return Ok(StepOutcome::done(format!(
            "Endpoint already configured: {}",
            endpoint
        )));
    }
    ctx.config.set([(API_DOMAIN, endpoint.as_str())]).await?;
    Ok(StepOutcome::done(format!("Endpoint set to {}", endpoint)))
}

pub async fn heartbeat_file(ctx: &SetupContext) -> SetupResult<StepOutcome> {
    let template = match tokio::fs::read_to_string(&ctx.paths.template).await {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SetupError::Validation(format!(
                "Heartbeat template not found at {} (run 'clawfriend install')",
                ctx.paths.template.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let existing = match tokio::fs::read_to_string(&ctx.paths.heartbeat).await {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    let outcome = merge_tasks(existing.as_deref(), template_task_section(&template));
    if outcome.created || outcome.added_count > 0 {
        if let Some(parent) = ctx.paths.heartbeat.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&ctx.paths.heartbeat, &outcome.content).await?;
    }

    let message = if outcome.created {
        format!(
            "Created {} with {} tasks",
            ctx.paths.heartbeat.display(),
            outcome.added_count
        )
    } else if outcome.added_count > 0 {
        format!("Added {} new tasks", outcome.added_count)
    } else {
        "Heartbeat tasks already up to date".to_string()
    };
    Ok(StepOutcome::done_with(
        message,
        json!({
            "path": ctx.paths.heartbeat.display().to_string(),
            "added": outcome.added_count,
            "created": outcome.created,
        }),
    ))
}

/// Shared mapping of [`EnsureOutcome`] for the job-installing steps.
pub(super) fn scheduled_job_outcome(
    outcome: EnsureOutcome,
    job: &str,
) -> SetupResult<StepOutcome> {
    match outcome {
        EnsureOutcome::AlreadyExists => Ok(StepOutcome::done(format!(
            "Job '{}' already scheduled",
            job
        ))),
        EnsureOutcome::Created => Ok(StepOutcome::done(format!("Scheduled job '{}'", job))),
        EnsureOutcome::Unavailable => {
            Err(SetupError::ToolUnavailable("The scheduler CLI".to_string()))
        }
        EnsureOutcome::Failed => Err(SetupError::ExternalCall(format!(
            "Failed to create job '{}'",
            job
        ))),
    }
}

pub async fn schedule_trigger(ctx: &SetupContext) -> SetupResult<StepOutcome> {
    let job = heartbeat_job();
    let outcome = ensure_job(ctx.triggers.as_ref(), &job).await;
    scheduled_job_outcome(outcome, &job.name)
}

pub async fn activation_watch(ctx: &SetupContext) -> SetupResult<StepOutcome> {
    activation::install(ctx).await
}

pub async fn wallet_and_register(
    ctx: &SetupContext,
    inputs: &SetupInputs,
) -> SetupResult<StepOutcome> {
    let Some(name) = inputs.identity_name.as_deref() else {
        return Ok(StepOutcome::skipped(
            "No agent name supplied; registration skipped",
        ));
    };

    let (wallet, created) = ensure_wallet(&ctx.config).await?;
    let address = wallet.address();
    ctx.config.set([(AGENT_NAME, name)]).await?;

    let endpoint = ctx.config.get(API_DOMAIN).await?.ok_or_else(|| {
        SetupError::Validation(
            "API endpoint is not configured; run configure-endpoint first".to_string(),
        )
    })?;
    let api = ApiClient::new(&endpoint)?;

    if let Some(api_key) = ctx.config.get(API_KEY).await? {
        match api.me(&api_key).await {
            Ok(profile) => {
                return Ok(StepOutcome::done_with(
                    format!("Already registered as {}", profile.name),
                    json!({
                        "agent": profile,
                        "walletAddress": address,
                        "walletCreated": created,
                    }),
                ));
            }
            Err(ApiError::Unauthorized(code)) => {
                warn!("Stored API key rejected (HTTP {}); registering again", code);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let message = registration_message(name, &address);
    let signature = wallet.sign_message(&message)?;
    let identity = api
        .register(&RegistrationRequest {
            name: name.to_string(),
            wallet_address: address.clone(),
            message,
            signature,
        })
        .await?;

    let mut updates = vec![(AGENT_ID, identity.agent.id.clone())];
    if let Some(key) = &identity.api_key {
        updates.push((API_KEY, key.clone()));
    }
    ctx.config.set(updates).await?;
    info!(agent = %identity.agent.id, "registered agent {}", name);

    Ok(StepOutcome::done_with(
        format!("Registered {} with wallet {}", name, address),
        json!({
            "agent": identity.agent,
            "walletAddress": address,
            "walletCreated": created,
            "claimUrl": identity.claim_url,
            "verificationCode": identity.verification_code,
        }),
    ))
}
