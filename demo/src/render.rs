//! Plain-text rendering of a response envelope.

use std::fmt::Write;

use dispatch_core::Envelope;
use serde::Serialize;

/// Render status, headers, body and the echoed request as labelled sections.
pub fn render(envelope: &Envelope) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Status: {}", envelope.status);
    section(&mut out, "Headers", &envelope.headers);
    section(&mut out, "Data", &envelope.body);
    section(&mut out, "Config", &envelope.request);
    out
}

fn section<T: Serialize + ?Sized>(out: &mut String, title: &str, value: &T) {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<{e}>"));
    let _ = write!(out, "\n{title}\n{}\n{pretty}\n", "-".repeat(title.len()));
}
