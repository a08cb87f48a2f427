use anyhow::Result;

use crate::core::setup::SetupContext;
use crate::core::setup::activation::{self, ActivationStatus};
use crate::core::terminal::{print_info, print_pending, print_success, print_warn};

/// Entry point of the activation monitor job.
pub async fn run_activation_check() -> Result<i32> {
    let ctx = SetupContext::from_platform();
    match activation::check(&ctx).await? {
        ActivationStatus::NotRegistered => {
            print_warn("Agent is not registered yet; run the wallet-and-register step.");
        }
        ActivationStatus::Pending { status } => {
            print_pending(&format!("Agent is not active yet (status: {}).", status));
        }
        ActivationStatus::Activated { name } => {
            print_success(&format!("Agent {} is now active.", name));
        }
        ActivationStatus::AlreadyActive => print_info("Agent is already active."),
    }
    Ok(0)
}
