//! Coloured one-line messages for the terminal.

use std::fmt;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

#[derive(Clone, Copy)]
enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn style(self) -> (&'static str, &'static str) {
        match self {
            Level::Info => ("\x1b[34m", "ℹ️"),
            Level::Success => ("\x1b[32m", "✅"),
            Level::Warning => ("\x1b[33m", "⚠️"),
            Level::Error => ("\x1b[31m", "❌"),
        }
    }
}

fn emit<T: fmt::Display>(level: Level, msg: T) {
    let (color, icon) = level.style();
    let line = format!("{}{}{} {}{}", color, BOLD, icon, RESET, msg);
    match level {
        Level::Error => eprintln!("{line}"),
        _ => println!("{line}"),
    }
}

pub fn info<T: fmt::Display>(msg: T) {
    emit(Level::Info, msg);
}

pub fn success<T: fmt::Display>(msg: T) {
    emit(Level::Success, msg);
}

pub fn warning<T: fmt::Display>(msg: T) {
    emit(Level::Warning, msg);
}

pub fn error<T: fmt::Display>(msg: T) {
    emit(Level::Error, msg);
}

/// Section header
pub fn header<T: fmt::Display>(msg: T) {
    println!("{}\x1b[34m=== {} ==={}", BOLD, msg, RESET);
}
