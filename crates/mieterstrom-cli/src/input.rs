use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Load a subcommand's JSON payload (a loan spec, project inputs, or a
/// sensitivity request): from `--input <path>` when given, otherwise from
/// piped stdin. Returns `Ok(None)` when neither source yields data, so the
/// caller can fall back to flags or report what is missing.
pub fn load_payload<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Some(from_file(path)?)),
        None => from_piped_stdin(),
    }
}

fn from_file<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    if !Path::new(path).is_file() {
        return Err(format!("No such input file: {path}").into());
    }
    let contents = fs::read_to_string(path).map_err(|e| format!("Failed to read '{path}': {e}"))?;
    serde_json::from_str(&contents).map_err(|e| format!("Failed to parse '{path}': {e}").into())
}

fn from_piped_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    // Interactive terminal: nothing is being piped
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let payload =
        serde_json::from_str(trimmed).map_err(|e| format!("Failed to parse stdin: {e}"))?;
    Ok(Some(payload))
}
