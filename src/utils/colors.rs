// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Terminal output helpers
//!
//! Task progress lines share one layout: two-space indent, a colored marker,
//! then the message.

use colored::Colorize;

/// Style for dimmed/secondary text
pub fn dimmed(msg: &str) -> colored::ColoredString {
    msg.dimmed()
}

/// Task started
pub fn print_info(msg: &str) {
    println!("  {} {}", "→".blue(), msg);
}

/// Task finished
pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Task failed
pub fn print_error(msg: &str) {
    println!("  {} {}", "✗".red(), msg);
}
