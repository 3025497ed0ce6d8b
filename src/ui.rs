use colored::Colorize;
use declarative::Report;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Symbol for a report line, picked from its leading verb
fn marker(message: &str) -> colored::ColoredString {
    let verb = message
        .rsplit(": ")
        .next()
        .unwrap_or(message)
        .split_whitespace()
        .next()
        .unwrap_or_default();
    match verb {
        "created" => "+".green(),
        "updated" => "~".yellow(),
        "deleted" => "-".red(),
        "would" => "?".cyan(),
        _ => "·".dimmed(),
    }
}

/// Print the messages of a report followed by a one-line verdict
pub fn print_report(report: &Report, dry_run: bool) {
    for message in &report.messages {
        println!("  {} {}", marker(message), message);
    }

    if !report.changed {
        success("Already in sync");
    } else if dry_run {
        info(&format!("{} change(s) pending", report.messages.len()));
    } else {
        success(&format!("{} change(s) applied", report.messages.len()));
    }
}
