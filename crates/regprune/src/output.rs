//! Terminal output for command results
//!
//! Progress and diagnostics go through `tracing` on stderr. These helpers
//! print the report itself.

use console::{style, StyledObject};

enum Marker {
    Ok,
    Failed,
    Caution,
    Note,
}

impl Marker {
    fn styled(&self) -> StyledObject<&'static str> {
        match self {
            Self::Ok => style("✓").green(),
            Self::Failed => style("✗").red(),
            Self::Caution => style("⚠").yellow(),
            Self::Note => style("ℹ").blue(),
        }
        .bold()
    }
}

fn line(marker: Marker, msg: &str) {
    match marker {
        Marker::Failed | Marker::Caution => eprintln!("{} {}", marker.styled(), msg),
        Marker::Ok | Marker::Note => println!("{} {}", marker.styled(), msg),
    }
}

pub fn success(msg: &str) {
    line(Marker::Ok, msg);
}

pub fn error(msg: &str) {
    line(Marker::Failed, msg);
}

pub fn warning(msg: &str) {
    line(Marker::Caution, msg);
}

pub fn info(msg: &str) {
    line(Marker::Note, msg);
}

/// Section title
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Indented `key: value` line
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// A shell command the user can copy
pub fn command(cmd: &str) {
    println!("  {} {}", style("$").dim(), style(cmd).cyan());
}
