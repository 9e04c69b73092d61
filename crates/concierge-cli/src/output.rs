//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use concierge_core::ApiError;

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning.
pub fn warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a response body: text as-is, JSON compact or pretty, nothing for
/// an empty body.
pub fn body(data: &Value, pretty: bool) -> Result<()> {
    match data {
        Value::Null => Ok(()),
        Value::String(text) => {
            println!("{}", text);
            Ok(())
        }
        _ if pretty => json_pretty(data),
        _ => json(data),
    }
}

/// Print a failed call on stderr, with the server's body when it sent one.
pub fn api_error(err: &ApiError) {
    error(&err.to_string());
    match &err.data {
        Value::Null => {}
        Value::String(text) if text.is_empty() => {}
        Value::String(text) => eprintln!("  {}", text.dimmed()),
        data => eprintln!("  {}", data.to_string().dimmed()),
    }
}
