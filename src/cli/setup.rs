use std::sync::Arc;

use anyhow::Result;
use console::style;
use serde_json::json;

use crate::core::setup::{
    BatchReport, SetupContext, SetupInputs, StepId, StepOutcome, parse_step_list, run_steps,
};
use crate::core::state::{ACTIVATED_FLAG, LAST_SETUP_FLAG, StepState};
use crate::core::terminal::{
    GuideSection, print_error, print_info, print_pending, print_skip, print_step, print_success,
};

pub async fn run_quick_setup(inputs: SetupInputs, json_output: bool) -> Result<i32> {
    let ctx = Arc::new(SetupContext::from_platform());
    if !json_output {
        print_step("Running ClawFriend setup...");
        println!();
    }
    let report = run_steps(ctx, &StepId::ALL, &inputs).await;
    finish(&report, json_output)
}

pub async fn run_step_list(list: &str, inputs: SetupInputs, json_output: bool) -> Result<i32> {
    let steps = match parse_step_list(list) {
        Ok(steps) => steps,
        Err(e) => {
            if json_output {
                let body = json!({"success": false, "error": e.to_string()});
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print_error(&e.to_string());
                print_info(&format!(
                    "Known steps: {}",
                    StepId::ALL.map(StepId::as_str).join(", ")
                ));
            }
            return Ok(1);
        }
    };

    let ctx = Arc::new(SetupContext::from_platform());
    let report = run_steps(ctx, &steps, &inputs).await;
    finish(&report, json_output)
}

fn finish(report: &BatchReport, json_output: bool) -> Result<i32> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        print_report(report);
    }
    Ok(if report.all_succeeded() { 0 } else { 1 })
}

fn print_report(report: &BatchReport) {
    for entry in &report.reports {
        let line = format!("{}: {}", entry.step.as_str(), entry.outcome.message());
        match &entry.outcome {
            StepOutcome::Done { .. } => print_success(&line),
            StepOutcome::Skipped { .. } => print_skip(&line),
            StepOutcome::Failed { .. } => print_error(&line),
            StepOutcome::Blocked { .. } => print_pending(&line),
        }
    }

    if let Some(StepOutcome::Done {
        data: Some(data), ..
    }) = report.get(StepId::WalletAndRegister)
        && let Some(claim_url) = data["claimUrl"].as_str()
    {
        let mut section = GuideSection::new("Claim your agent")
            .status("Claim URL", &style(claim_url).underlined().cyan().to_string());
        if let Some(code) = data["verificationCode"].as_str() {
            section = section.status("Verification code", code);
        }
        section
            .blank()
            .text("Share the link with the owner; the activation monitor reports when it is done.")
            .print();
    }

    let failed = report.failed();
    if !failed.is_empty() {
        let names: Vec<&str> = failed.iter().map(|s| s.as_str()).collect();
        println!(
            "\n Retry with {}\n",
            style(format!("clawfriend run-steps {}", names.join(","))).cyan()
        );
    }
}

pub async fn run_status() -> Result<()> {
    let ctx = SetupContext::from_platform();
    let doc = ctx.state.snapshot().await?;
    let statuses = doc.step_statuses();

    print_step("Setup status");
    for step in StepId::ALL {
        let name = step.as_str();
        match statuses.get(name) {
            Some(status) => {
                let line = match &status.error {
                    Some(err) => format!("{} ({}): {}", name, status.timestamp, err),
                    None => format!("{} ({})", name, status.timestamp),
                };
                match status.status {
                    StepState::Done => print_success(&line),
                    StepState::Skipped => print_skip(&line),
                    StepState::Error => print_error(&line),
                    StepState::Pending | StepState::Running => print_pending(&line),
                }
            }
            None => print_pending(&format!("{} (not run)", name)),
        }
    }

    let mut section = GuideSection::new("Agent").status(
        "Activated",
        if doc.bool_flag(ACTIVATED_FLAG) { "yes" } else { "no" },
    );
    if let Some(at) = doc.flag(LAST_SETUP_FLAG).and_then(|v| v.as_str()) {
        section = section.status("Last setup", at);
    }
    section = section.status("State file", &ctx.state.path().display().to_string());
    section.print();
    println!();
    Ok(())
}

pub async fn run_reset() -> Result<()> {
    let ctx = SetupContext::from_platform();
    ctx.state.update(|doc| doc.clear_step_statuses()).await?;
    print_success("Step statuses cleared.");
    Ok(())
}
