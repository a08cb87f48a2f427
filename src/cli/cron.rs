use anyhow::Result;

use crate::core::scheduler::{OpenClawCron, TriggerClient};
use crate::core::terminal::{GuideSection, print_error, print_info, print_success};

pub async fn run_cron_command(args: &[String]) -> Result<i32> {
    let sub_cmd = args.get(2).map(String::as_str).unwrap_or("");
    let client = OpenClawCron::from_env();

    match sub_cmd {
        "list" => {
            if !client.available().await {
                print_error("The scheduler CLI is not available.");
                return Ok(1);
            }
            let output = client.list().await;
            if output.trim().is_empty() {
                print_info("No scheduled jobs.");
            } else {
                println!("{}", output.trim_end());
            }
            Ok(0)
        }
        "remove" | "rm" => {
            let Some(name) = args.get(3) else {
                print_error("Usage: clawfriend cron remove <name>");
                return Ok(2);
            };
            if client.remove(name).await {
                print_success(&format!("Removed job '{}'", name));
                Ok(0)
            } else {
                print_error(&format!("Could not remove job '{}'", name));
                Ok(1)
            }
        }
        _ => {
            GuideSection::new("clawfriend cron")
                .command("list", "List scheduled jobs")
                .command("remove <name>", "Remove a scheduled job")
                .print();
            println!();
            Ok(if sub_cmd.is_empty() { 0 } else { 2 })
        }
    }
}
