mod cli;
mod core;
mod logging;
mod platform;

use crate::core::terminal;

#[tokio::main]
async fn main() {
    match cli::run_main().await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            terminal::print_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}
