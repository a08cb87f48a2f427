use anyhow::Result;

use crate::core::config::{API_DOMAIN, mask_secret};
use crate::core::setup::{SetupContext, validate_endpoint};
use crate::core::terminal::{GuideSection, print_error, print_info, print_success};

pub async fn run_config_command(args: &[String]) -> Result<i32> {
    let sub_cmd = args.get(2).map(String::as_str).unwrap_or("");
    let ctx = SetupContext::from_platform();

    match sub_cmd {
        "get" => {
            if let Some(key) = args.get(3) {
                match ctx.config.get(key).await? {
                    Some(value) => {
                        println!("{}", mask_secret(key, &value));
                        Ok(0)
                    }
                    None => {
                        print_error(&format!("{} is not set", key));
                        Ok(1)
                    }
                }
            } else {
                let entries = ctx.config.entries().await?;
                if entries.is_empty() {
                    print_info(&format!("No settings in {}", ctx.config.path().display()));
                    return Ok(0);
                }
                let mut section = GuideSection::new("Settings");
                for (key, value) in &entries {
                    section = section.status(key, &mask_secret(key, value));
                }
                section.print();
                println!();
                Ok(0)
            }
        }
        "set" => {
            let (Some(key), Some(value)) = (args.get(3), args.get(4)) else {
                print_error("Usage: clawfriend config set <KEY> <VALUE>");
                return Ok(2);
            };
            let value = if key == API_DOMAIN {
                validate_endpoint(value)?
            } else {
                value.trim().to_string()
            };
            ctx.config.set([(key.as_str(), value.as_str())]).await?;
            print_success(&format!("{} updated", key));
            Ok(0)
        }
        _ => {
            GuideSection::new("clawfriend config")
                .command("get [KEY]", "Show one or all settings (secrets masked)")
                .command("set <KEY> <VALUE>", "Update a setting")
                .print();
            println!();
            Ok(if sub_cmd.is_empty() { 0 } else { 2 })
        }
    }
}
