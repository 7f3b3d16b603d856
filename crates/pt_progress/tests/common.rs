// Common test utilities for the integration tests
#![allow(dead_code)]

pub use pt_progress::terminal::test_helpers::{init_test_logging, with_timeout, SharedBuffer};
pub use pt_progress::terminal::TestEnv;

use pt_progress::{BarWidth, MonitorConfig, ResizeStrategy};

/// Fast, signal-free configuration for tests
pub fn test_config(bar_width: BarWidth) -> MonitorConfig {
    MonitorConfig::builder()
        .refresh_rate_ms(1)
        .bar_width(bar_width)
        .head('>')
        .body('=')
        .resize(ResizeStrategy::Disabled)
        .restore_on_signal(false)
        .build()
        .expect("test configuration is valid")
}

/// Removes the CSI sequences the session emits, keeping `\r` and `\n`.
pub fn strip_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // parameters and intermediates, then one final byte in @..~
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Every physical line segment of the output, split on `\r` and `\n`,
/// with escapes removed and empty segments dropped.
pub fn segments(raw: &str) -> Vec<String> {
    strip_escapes(raw)
        .split(|c| c == '\r' || c == '\n')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `line` is a complete bar line: `<label>: [<fill><head><blank>] <pct>%`
pub fn is_bar_line(line: &str, fill: char, head: char) -> bool {
    let Some((label, rest)) = line.split_once(": [") else {
        return false;
    };
    if !label.starts_with("Thread ") {
        return false;
    }
    let Some((bar, percent)) = rest.rsplit_once("] ") else {
        return false;
    };
    let Some(number) = percent.strip_suffix('%') else {
        return false;
    };
    let Ok(value) = number.trim_start().parse::<u8>() else {
        return false;
    };
    if value > 100 || number.len() != 3 {
        return false;
    }
    let body = bar.trim_end_matches(' ');
    let Some(filled) = body.strip_suffix(head) else {
        return false;
    };
    filled.chars().all(|c| c == fill)
}

#[test]
fn test_strip_escapes() {
    assert_eq!(strip_escapes("\x1b[?25l\x1b[2Kabc\x1b[12A\r\n"), "abc\r\n");
}

#[test]
fn test_is_bar_line() {
    assert!(is_bar_line("Thread 1: [===>  ]  50%", '=', '>'));
    assert!(is_bar_line("Thread 12: [>     ]   0%", '=', '>'));
    assert!(!is_bar_line("Thread 1: [==msg 3", '=', '>'));
    assert!(!is_bar_line("Thread 1: [==>  ]  50%msg", '=', '>'));
}
