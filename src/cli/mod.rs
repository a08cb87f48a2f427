mod activation;
mod config;
mod cron;
mod doctor;
mod install;
mod setup;

use anyhow::Result;
use console::style;

use crate::core::setup::{SetupInputs, StepId};
use crate::core::terminal::{self, GuideSection, print_error};
use crate::platform::{NativePlatform, Platform};

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Setup")
        .command("quick-setup <endpoint> [name]", "Run every setup step")
        .command(
            "run-steps <steps> [endpoint] [name]",
            "Run a comma-separated subset of steps",
        )
        .command("install", "Create the data directory and heartbeat template")
        .print();

    GuideSection::new("Inspection")
        .command("check", "Verify setup prerequisites (exit 1 if any is missing)")
        .command("status", "Show the recorded status of every step")
        .command("reset", "Forget recorded step statuses")
        .command("activation-check", "Poll the API until the agent is active")
        .print();

    GuideSection::new("Management")
        .command("cron list", "List scheduled jobs")
        .command("cron remove <name>", "Remove a scheduled job")
        .command("config get [KEY]", "Show settings (secrets masked)")
        .command("config set <KEY> <VALUE>", "Update a setting")
        .print();

    let mut steps = GuideSection::new("Steps");
    for step in StepId::ALL {
        steps = steps.command(step.as_str(), step.description());
    }
    steps
        .blank()
        .hint("clawfriend quick-setup https://api.clawfriend.ai my-agent", "")
        .hint("clawfriend run-steps heartbeat-file,schedule-trigger --json", "")
        .print();

    println!(
        "\n {} {} <command> [arguments] [--json]\n",
        style("Usage:").bold(),
        style("clawfriend").green()
    );
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SetupArgs {
    pub positionals: Vec<String>,
    pub json: bool,
}

impl SetupArgs {
    /// Endpoint and identity name starting at positional `offset`.
    pub fn inputs(&self, offset: usize) -> SetupInputs {
        SetupInputs::new(
            self.positionals.get(offset).cloned(),
            self.positionals.get(offset + 1).cloned(),
        )
    }
}

pub(crate) fn parse_setup_args(args: &[String], start: usize) -> SetupArgs {
    let mut parsed = SetupArgs::default();
    for arg in args.iter().skip(start) {
        match arg.as_str() {
            "--json" => parsed.json = true,
            // Unknown flags are ignored.
            other if other.starts_with("--") => {}
            other => parsed.positionals.push(other.to_string()),
        }
    }
    parsed
}

/// Dispatch the command line and return the process exit code.
pub async fn run_main() -> Result<i32> {
    let args: Vec<String> = std::env::args().collect();
    let Some(cmd) = args.get(1).map(String::as_str) else {
        print_help();
        return Ok(0);
    };

    if !matches!(cmd, "help" | "--help" | "-h") {
        crate::logging::init(&NativePlatform::data_dir());
    }

    match cmd {
        "quick-setup" => {
            let parsed = parse_setup_args(&args, 2);
            if parsed.positionals.first().is_none_or(|s| s.is_empty()) {
                print_error("Usage: clawfriend quick-setup <endpoint> [name] [--json]");
                return Ok(2);
            }
            setup::run_quick_setup(parsed.inputs(0), parsed.json).await
        }
        "run-steps" => {
            let mut parsed = parse_setup_args(&args, 2);
            if parsed.positionals.is_empty() {
                print_error("Usage: clawfriend run-steps <steps> [endpoint] [name] [--json]");
                return Ok(2);
            }
            let list = parsed.positionals.remove(0);
            setup::run_step_list(&list, parsed.inputs(0), parsed.json).await
        }
        "check" => doctor::run_check().await,
        "status" => {
            setup::run_status().await?;
            Ok(0)
        }
        "reset" => {
            setup::run_reset().await?;
            Ok(0)
        }
        "install" => {
            install::run_install().await?;
            Ok(0)
        }
        "activation-check" => activation::run_activation_check().await,
        "cron" => cron::run_cron_command(&args).await,
        "config" => config::run_config_command(&args).await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(0)
        }
        _ => {
            print_error(&format!("Unknown command: {}", cmd));
            print_help();
            Ok(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_setup_args;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn quick_setup_reads_endpoint_name_and_json() {
        let args = argv(&[
            "clawfriend",
            "quick-setup",
            "https://api.clawfriend.ai",
            "alpha",
            "--json",
        ]);
        let parsed = parse_setup_args(&args, 2);
        assert!(parsed.json);
        let inputs = parsed.inputs(0);
        assert_eq!(inputs.endpoint.as_deref(), Some("https://api.clawfriend.ai"));
        assert_eq!(inputs.identity_name.as_deref(), Some("alpha"));
    }

    #[test]
    fn flags_may_appear_anywhere() {
        let args = argv(&[
            "clawfriend",
            "run-steps",
            "--json",
            "heartbeat-file",
            "--verbose",
        ]);
        let parsed = parse_setup_args(&args, 2);
        assert!(parsed.json);
        assert_eq!(parsed.positionals, vec!["heartbeat-file"]);
        assert_eq!(parsed.inputs(1).endpoint, None);
    }

    #[test]
    fn blank_name_is_treated_as_missing() {
        let args = argv(&["clawfriend", "quick-setup", "https://a.b", "  "]);
        assert_eq!(parse_setup_args(&args, 2).inputs(0).identity_name, None);
    }
}
