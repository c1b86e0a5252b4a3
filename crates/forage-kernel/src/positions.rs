//! Positions codec: the creator's ordered slot -> label sequence.
//!
//! A creator definition carries `positions`, one label per forager slot. The
//! stored form is either a structured JSON array or its textual encoding,
//! including the legacy single-quoted list form `['A', 'B']` that older
//! recorded chains contain. Decoding happens exactly once, here, at the
//! boundary; downstream slot lookups only ever see `Vec<String>`.

use serde_json::Value;
use tracing::debug;

/// Key under which a creator definition stores its positions.
pub const POSITIONS_FIELD: &str = "positions";

/// Errors raised while decoding positions or indexing into them.
#[derive(Debug, thiserror::Error)]
pub enum PositionsError {
    #[error("positions could not be parsed from {0:?}")]
    Unparseable(String),

    #[error("positions value is neither a sequence nor its textual encoding: {0}")]
    NotASequence(Value),

    #[error("creator definition is not a mapping: {0}")]
    NotAMapping(Value),

    #[error("creator definition has no {field:?} field", field = POSITIONS_FIELD)]
    MissingField,

    #[error("slot {slot} is out of range for {len} positions")]
    SlotOutOfRange { slot: usize, len: usize },
}

/// Decode a stored positions value into its ordered labels.
pub fn decode_positions(value: &Value) -> Result<Vec<String>, PositionsError> {
    match value {
        Value::Array(items) => labels_from_items(items, value),
        Value::String(text) => decode_positions_text(text),
        other => Err(PositionsError::NotASequence(other.clone())),
    }
}

/// Pull `positions` out of a creator definition and decode them.
pub fn positions_from_definition(definition: &Value) -> Result<Vec<String>, PositionsError> {
    let fields = definition
        .as_object()
        .ok_or_else(|| PositionsError::NotAMapping(definition.clone()))?;
    let stored = fields
        .get(POSITIONS_FIELD)
        .ok_or(PositionsError::MissingField)?;
    decode_positions(stored)
}

/// The label a slot resolves to.
pub fn position_for_slot(positions: &[String], slot: usize) -> Result<&str, PositionsError> {
    positions
        .get(slot)
        .map(String::as_str)
        .ok_or(PositionsError::SlotOutOfRange {
            slot,
            len: positions.len(),
        })
}

fn labels_from_items(items: &[Value], whole: &Value) -> Result<Vec<String>, PositionsError> {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(PositionsError::NotASequence(whole.clone())),
        })
        .collect()
}

fn decode_positions_text(text: &str) -> Result<Vec<String>, PositionsError> {
    // Canonical textual encoding is JSON.
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
        debug!(count = items.len(), "decoded positions from JSON text");
        return labels_from_items(&items, &Value::String(text.to_string()));
    }

    // Legacy encoding: a single-quoted list literal.
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| PositionsError::Unparseable(text.to_string()))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|item| legacy_label(item, text))
        .collect()
}

fn legacy_label(item: &str, whole: &str) -> Result<String, PositionsError> {
    let item = item.trim();
    for quote in ['\'', '"'] {
        if let Some(stripped) = item
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return Ok(stripped.to_string());
        }
    }
    // Bare integer labels appear in older chains.
    if !item.is_empty() && item.parse::<i64>().is_ok() {
        return Ok(item.to_string());
    }
    Err(PositionsError::Unparseable(whole.to_string()))
}
