use super::context::SetupContext;
use super::steps::validate_endpoint;
use crate::core::config::{API_DOMAIN, API_KEY, EVM_ADDRESS};
use crate::core::error::SetupResult;
use crate::core::heartbeat::{extract_tasks, template_task_section};
use crate::core::scheduler::HEARTBEAT_JOB_NAME;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prerequisite {
    pub name: &'static str,
    pub satisfied: bool,
    pub detail: String,
}

impl Prerequisite {
    fn new(name: &'static str, satisfied: bool, detail: impl Into<String>) -> Self {
        Self {
            name,
            satisfied,
            detail: detail.into(),
        }
    }
}

/// Read-only inspection of everything setup is supposed to have produced.
pub async fn check_prerequisites(ctx: &SetupContext) -> SetupResult<Vec<Prerequisite>> {
    let mut out = Vec::new();

    out.push(match ctx.config.get(API_DOMAIN).await? {
        Some(endpoint) => match validate_endpoint(&endpoint) {
            Ok(_) => Prerequisite::new("API endpoint", true, endpoint),
            Err(e) => Prerequisite::new("API endpoint", false, e.to_string()),
        },
        None => Prerequisite::new("API endpoint", false, "not configured"),
    });

    out.push(heartbeat_prerequisite(ctx).await?);

    out.push(if !ctx.triggers.available().await {
        Prerequisite::new("Heartbeat job", false, "scheduler CLI not available")
    } else if ctx.triggers.exists(HEARTBEAT_JOB_NAME).await {
        Prerequisite::new("Heartbeat job", true, HEARTBEAT_JOB_NAME)
    } else {
        Prerequisite::new("Heartbeat job", false, "not scheduled")
    });

    out.push(match ctx.config.get(EVM_ADDRESS).await? {
        Some(address) => Prerequisite::new("Wallet", true, address),
        None => Prerequisite::new("Wallet", false, "no wallet generated"),
    });

    out.push(if ctx.config.get(API_KEY).await?.is_some() {
        Prerequisite::new("Registration", true, "API key stored")
    } else {
        Prerequisite::new("Registration", false, "agent not registered")
    });

    Ok(out)
}

async fn heartbeat_prerequisite(ctx: &SetupContext) -> SetupResult<Prerequisite> {
    let Ok(template) = tokio::fs::read_to_string(&ctx.paths.template).await else {
        return Ok(Prerequisite::new(
            "Heartbeat tasks",
            false,
            format!("template missing at {}", ctx.paths.template.display()),
        ));
    };
    let Ok(current) = tokio::fs::read_to_string(&ctx.paths.heartbeat).await else {
        return Ok(Prerequisite::new(
            "Heartbeat tasks",
            false,
            format!("{} does not exist", ctx.paths.heartbeat.display()),
        ));
    };

    let present: Vec<String> = extract_tasks(&current)
        .into_iter()
        .map(|t| t.identifier)
        .collect();
    let missing: Vec<String> = extract_tasks(template_task_section(&template))
        .into_iter()
        .map(|t| t.identifier)
        .filter(|id| !present.contains(id))
        .collect();

    Ok(if missing.is_empty() {
        Prerequisite::new("Heartbeat tasks", true, ctx.paths.heartbeat.display().to_string())
    } else {
        Prerequisite::new(
            "Heartbeat tasks",
            false,
            format!("missing: {}", missing.join(", ")),
        )
    })
}
