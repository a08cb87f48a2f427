//! Batch execution of setup steps.
//!
//! A batch runs in two phases: the gating step (`configure-endpoint`) alone,
//! then every other requested step concurrently on a `JoinSet`. An endpoint
//! passed with the batch adds the gating step when it was not requested.
//! Step errors are turned into outcomes and persisted; the batch itself
//! never fails.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::context::SetupContext;
use super::steps;
use super::types::{BatchReport, FailureReason, SetupInputs, StepId, StepOutcome, StepReport};
use crate::core::state::{LAST_SETUP_FLAG, StepState, StepStatus};

pub async fn run_steps(
    ctx: Arc<SetupContext>,
    requested: &[StepId],
    inputs: &SetupInputs,
) -> BatchReport {
    let requested = &with_implied_steps(requested, inputs);
    let inputs = Arc::new(inputs.clone());
    let mut outcomes: HashMap<StepId, StepOutcome> = HashMap::new();

    let (gates, parallel): (Vec<StepId>, Vec<StepId>) =
        requested.iter().copied().partition(|s| s.is_gate());

    for gate in gates {
        let outcome = run_step(&ctx, gate, &inputs).await;
        let failed = !outcome.success();
        outcomes.insert(gate, outcome);
        if failed {
            warn!("{} failed; remaining steps were not started", gate.as_str());
            for step in &parallel {
                outcomes.insert(*step, StepOutcome::Blocked { by: gate });
            }
            return collect(requested, outcomes);
        }
    }

    let mut set = JoinSet::new();
    for step in parallel.iter().copied() {
        let ctx = ctx.clone();
        let inputs = inputs.clone();
        set.spawn(async move {
            let outcome = run_step(&ctx, step, &inputs).await;
            (step, outcome)
        });
    }

    while let Some(res) = set.join_next().await {
        match res {
            Ok((step, outcome)) => {
                outcomes.insert(step, outcome);
            }
            Err(e) => warn!("setup step task aborted: {}", e),
        }
    }

    for step in &parallel {
        if !outcomes.contains_key(step) {
            let outcome = StepOutcome::Failed {
                message: "step terminated unexpectedly".to_string(),
                reason: FailureReason::Io,
            };
            persist(&ctx, *step, &outcome).await;
            outcomes.insert(*step, outcome);
        }
    }

    if let Err(e) = ctx
        .state
        .update(|doc| doc.set_flag(LAST_SETUP_FLAG, Utc::now().to_rfc3339()))
        .await
    {
        warn!("failed to record setup timestamp: {}", e);
    }

    collect(requested, outcomes)
}

/// Prepends `configure-endpoint` when an endpoint is given without it.
fn with_implied_steps(requested: &[StepId], inputs: &SetupInputs) -> Vec<StepId> {
    let mut steps = requested.to_vec();
    if inputs.endpoint.is_some() && !steps.contains(&StepId::ConfigureEndpoint) {
        steps.insert(0, StepId::ConfigureEndpoint);
    }
    steps
}

fn collect(requested: &[StepId], mut outcomes: HashMap<StepId, StepOutcome>) -> BatchReport {
    let reports = requested
        .iter()
        .filter_map(|step| {
            outcomes.remove(step).map(|outcome| StepReport {
                step: *step,
                outcome,
            })
        })
        .collect();
    BatchReport { reports }
}

async fn run_step(ctx: &SetupContext, step: StepId, inputs: &SetupInputs) -> StepOutcome {
    if let Err(e) = ctx
        .state
        .record_step(StepStatus::new(step.as_str(), StepState::Running))
        .await
    {
        warn!("failed to mark {} as running: {}", step.as_str(), e);
    }

    let result = match step {
        StepId::ConfigureEndpoint => steps::configure_endpoint(ctx, inputs).await,
        StepId::HeartbeatFile => steps::heartbeat_file(ctx).await,
        StepId::ScheduleTrigger => steps::schedule_trigger(ctx).await,
        StepId::ActivationWatch => steps::activation_watch(ctx).await,
        StepId::WalletAndRegister => steps::wallet_and_register(ctx, inputs).await,
    };
    let outcome = result.unwrap_or_else(StepOutcome::from_error);

    info!(
        step = step.as_str(),
        status = outcome.state().as_str(),
        "{}",
        outcome.message()
    );
    persist(ctx, step, &outcome).await;
    outcome
}

async fn persist(ctx: &SetupContext, step: StepId, outcome: &StepOutcome) {
    let Some(status) = outcome.to_status(step) else {
        return;
    };
    if let Err(e) = ctx.state.record_step(status).await {
        warn!("failed to persist status of {}: {}", step.as_str(), e);
    }
}
