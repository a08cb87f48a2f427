use anyhow::Result;
use console::style;

use crate::core::heartbeat::{BUNDLED_TEMPLATE, HEARTBEAT_FILE};
use crate::core::terminal::{self, print_info, print_status, print_success, print_warn};
use crate::platform::{self, NativePlatform, Platform};

/// Non-interactive first-run setup: data directory scaffold and the bundled
/// heartbeat template. Safe to call from a piped install script.
pub async fn run_install() -> Result<()> {
    terminal::print_banner();
    println!(
        "  {}\n",
        style("Setting up clawfriend directory structure...").bold()
    );

    let data_dir = NativePlatform::data_dir();
    let skill_dir = platform::skill_dir(&data_dir);
    tokio::fs::create_dir_all(data_dir.join("logs")).await?;
    tokio::fs::create_dir_all(&skill_dir).await?;
    NativePlatform::restrict_dir_permissions(&data_dir);
    print_status("Data directory", &data_dir.display().to_string());

    let template = skill_dir.join(HEARTBEAT_FILE);
    if tokio::fs::try_exists(&template).await? {
        print_info(&format!("Keeping existing template {}", template.display()));
    } else {
        tokio::fs::write(&template, BUNDLED_TEMPLATE).await?;
        print_success(&format!("Wrote heartbeat template to {}", template.display()));
    }

    let workspace = NativePlatform::workspace_dir();
    if !workspace.exists() {
        print_warn(&format!(
            "Agent workspace {} does not exist yet; heartbeat-file will create it.",
            workspace.display()
        ));
    }

    print_success("Installation complete!");
    println!(
        "\n  Run {} to finish setup.\n",
        style("clawfriend quick-setup <endpoint> [name]").cyan().bold()
    );
    Ok(())
}
