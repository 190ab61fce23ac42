//! Terminal output styling for docker-menu
//!
//! Pastel palette shared by every message the wizard prints outside of prompts.

use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use std::io::{Write, stdout};

/// Print a success message with a green checkmark
pub fn success(message: &str) {
    // Pastel mint green: RGB(152, 225, 152)
    println!(
        "{} {}",
        "✓".truecolor(152, 225, 152).bold(),
        message.bright_white()
    );
}

/// Print an error message with a red X
pub fn error(message: &str) {
    // Pastel coral/salmon: RGB(255, 160, 160)
    eprintln!(
        "{} {}",
        "✗".truecolor(255, 160, 160).bold(),
        message.bright_white()
    );
}

/// Print a warning message with a yellow warning symbol
pub fn warning(message: &str) {
    // Pastel cream/yellow: RGB(255, 230, 160)
    println!(
        "{} {}",
        "⚠".truecolor(255, 230, 160).bold(),
        message.bright_white()
    );
}

/// Print an info message with a blue info symbol
pub fn info(message: &str) {
    // Pastel sky blue: RGB(160, 200, 255)
    println!(
        "{} {}",
        "ℹ".truecolor(160, 200, 255).bold(),
        message.bright_white()
    );
}

/// Print a section header with a separator line
pub fn section(title: &str) {
    // Pastel lavender: RGB(181, 174, 254)
    println!("\n{}", title.truecolor(181, 174, 254).bold());
    // Brighter grey: RGB(160, 160, 160)
    println!("{}", "─".repeat(50).truecolor(160, 160, 160));
}

/// Print a dimmed/muted message
pub fn dimmed(message: &str) {
    println!("{}", message.truecolor(160, 160, 160));
}

/// Print a message in bright white (for titles and emphasis)
pub fn bright_white(message: &str) {
    println!("{}", message.bright_white());
}

/// Print one line of the installation progress view
pub fn live_line(line: &str) {
    // Softer pastel teal: RGB(120, 180, 195)
    println!("{} {}", "│".truecolor(120, 180, 195), line.truecolor(160, 160, 160));
    let _ = stdout().flush();
}

/// Print a blank line for spacing
pub fn blank() {
    println!();
}

/// Clear the terminal and move the cursor home
pub fn clear_screen() {
    let mut out = stdout();
    if execute!(out, Clear(ClearType::All), MoveTo(0, 0)).is_err() {
        // Not a terminal; nothing to clear
        println!();
    }
}
