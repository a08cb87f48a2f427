use anyhow::Result;
use console::style;

use crate::core::setup::{SetupContext, check_prerequisites};
use crate::core::terminal::{print_error, print_step, print_success};

/// Report every setup prerequisite. Exit code 0 only when all are satisfied.
pub async fn run_check() -> Result<i32> {
    print_step("Checking ClawFriend setup...");
    println!();

    let ctx = SetupContext::from_platform();
    let checks = check_prerequisites(&ctx).await?;

    for check in &checks {
        let line = format!("{}: {}", check.name, check.detail);
        if check.satisfied {
            print_success(&line);
        } else {
            print_error(&line);
        }
    }
    println!();

    if checks.iter().all(|c| c.satisfied) {
        print_success("All prerequisites are satisfied.");
        Ok(0)
    } else {
        println!(
            " Run {} to fix the missing pieces.\n",
            style("clawfriend quick-setup <endpoint> [name]").cyan().bold()
        );
        Ok(1)
    }
}
