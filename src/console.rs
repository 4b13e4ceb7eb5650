//! Stateless console formatting helpers
//!
//! ANSI coloring for the interactive output. Every helper returns a new
//! `String`; there is no global color state to mutate or restore.

const RED: &str = "\x1b[0;31m";
const GREEN: &str = "\x1b[0;32m";
const YELLOW: &str = "\x1b[1;33m";
const BLUE: &str = "\x1b[0;34m";
const CYAN: &str = "\x1b[0;36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Startup banner - embedded at compile time from assets/banner.txt
const BANNER: &str = include_str!("../assets/banner.txt");

fn paint(code: &str, text: &str) -> String {
    format!("{code}{text}{RESET}")
}

pub fn red(text: &str) -> String {
    paint(RED, text)
}

pub fn green(text: &str) -> String {
    paint(GREEN, text)
}

pub fn yellow(text: &str) -> String {
    paint(YELLOW, text)
}

pub fn blue(text: &str) -> String {
    paint(BLUE, text)
}

pub fn cyan(text: &str) -> String {
    paint(CYAN, text)
}

pub fn bold(text: &str) -> String {
    paint(BOLD, text)
}

/// Print the startup banner, colored green, followed by a blank line.
pub fn print_banner() {
    for line in BANNER.lines() {
        println!("{}", green(line));
    }
    println!();
}
