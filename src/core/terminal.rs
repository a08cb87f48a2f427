use console::{Emoji, style};

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "[ok]");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "[i]");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "[x]");
pub static SKIP_ICON: Emoji<'_, '_> = Emoji("⏭️  ", "[-]");
pub static PENDING_ICON: Emoji<'_, '_> = Emoji("⏳ ", "[ ]");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_skip(msg: &str) {
    println!("{} {}", SKIP_ICON, style(msg).dim());
}

pub fn print_pending(msg: &str) {
    println!("{} {}", PENDING_ICON, style(msg).dim());
}

pub fn print_status(label: &str, msg: &str) {
    println!("  {} {}: {}", GEAR, style(label).bold().cyan(), msg);
}

pub fn print_step(step: &str) {
    println!("{} {}", SPARKLE, style(step).bold());
}

pub fn print_banner() {
    println!();
    println!(
        "{} {}",
        style("clawfriend").bold().magenta(),
        style(env!("CARGO_PKG_VERSION")).dim()
    );
    println!("{}\n", style("Wallet-backed agent identity and heartbeat setup.").cyan());
}

/// A titled block of aligned help lines, used by `help` and subcommand usage.
pub struct GuideSection {
    title: String,
    lines: Vec<String>,
}

impl GuideSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn command(mut self, name: &str, description: &str) -> Self {
        self.lines.push(format!(
            "  {} {}",
            style(format!("{:<34}", name)).green(),
            description
        ));
        self
    }

    pub fn status(mut self, label: &str, value: &str) -> Self {
        self.lines
            .push(format!("  {}: {}", style(label).bold().cyan(), value));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        for line in text.lines() {
            self.lines.push(format!("  {}", line));
        }
        self
    }

    pub fn hint(mut self, example: &str, note: &str) -> Self {
        if note.is_empty() {
            self.lines.push(format!("    $ {}", style(example).dim()));
        } else {
            self.lines
                .push(format!("    $ {}  {}", style(example).dim(), note));
        }
        self
    }

    pub fn blank(mut self) -> Self {
        self.lines.push(String::new());
        self
    }

    pub fn print(self) {
        println!("\n{}", style(self.title).bold().underlined());
        for line in self.lines {
            println!("{}", line);
        }
    }
}
