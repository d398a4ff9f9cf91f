//! JSON text <-> path value conversion for the command line

use crate::Value;

use super::CliError;

/// Parses JSON text into a [`Value`].
pub fn parse_json(text: &str) -> Result<Value, CliError> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    Ok(Value::from(json))
}

/// `true`, `false` or `null` for a three-valued answer.
pub fn tri_to_json(answer: Option<bool>) -> serde_json::Value {
    answer.map_or(serde_json::Value::Null, serde_json::Value::Bool)
}

pub fn format_json(json: &serde_json::Value, pretty: bool) -> Result<String, CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(json)
    } else {
        serde_json::to_string(json)
    }?;
    Ok(text)
}
