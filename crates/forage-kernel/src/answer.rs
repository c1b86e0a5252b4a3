//! Answer formatting and validation for slider submissions.
//!
//! A two-stage pipeline shared by every slider page:
//! - `format_slider_answer` turns a raw submission into either an in-bounds
//!   float or the `INVALID_RESPONSE` sentinel
//! - `validate_formatted` gates page progression on that sentinel
//!
//! Malformed input is data for both stages, never an error: the caller sees
//! a sentinel to re-prompt on, not a failure to handle.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// Literal sentinel recorded when a submission could not be read.
pub const INVALID_RESPONSE: &str = "INVALID_RESPONSE";

/// Inclusive widget bounds for a slider control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderBounds {
    pub min: f64,
    pub max: f64,
}

impl SliderBounds {
    /// The social-contract range: every parameter lives in `[0, 1]`.
    pub const UNIT: SliderBounds = SliderBounds { min: 0.0, max: 1.0 };

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for SliderBounds {
    fn default() -> Self {
        SliderBounds::UNIT
    }
}

/// A formatted slider submission: a usable float or the rejection sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormattedAnswer {
    Value(f64),
    Invalid,
}

impl FormattedAnswer {
    /// Storage form: the float itself, or the literal sentinel string.
    pub fn to_value(&self) -> Value {
        match self {
            FormattedAnswer::Value(v) => Value::from(*v),
            FormattedAnswer::Invalid => Value::String(INVALID_RESPONSE.to_string()),
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, FormattedAnswer::Invalid)
    }
}

/// Accept a bare float or the legacy one-element array wrap around one.
///
/// Older recorded seeds carry values like `[0.5]` where `0.5` was meant;
/// readers unwrap, writers never produce the wrapped form.
pub(crate) fn unwrap_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Array(items) if items.len() == 1 => items[0].as_f64(),
        _ => None,
    }
}

/// Format stage: coerce a raw submission into a float within `bounds`.
///
/// Accepts a JSON number, a numeric string, or a one-element array wrap of
/// either. Everything else, including out-of-bounds and non-finite values,
/// formats to [`FormattedAnswer::Invalid`].
pub fn format_slider_answer(raw: &Value, bounds: SliderBounds) -> FormattedAnswer {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Array(items) if items.len() == 1 => match &items[0] {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        },
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() && bounds.contains(v) => {
            debug!(value = v, "formatted slider submission");
            FormattedAnswer::Value(v)
        }
        _ => {
            info!(raw = %raw, "slider submission did not format, recording sentinel");
            FormattedAnswer::Invalid
        }
    }
}

/// A rejected validation: the page is re-presented with this message.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedValidation {
    pub message: String,
}

/// Validate stage: reject a stored answer equal to the sentinel.
///
/// Runs after formatting; a `Some` return means the participant stays on the
/// page. Anything that is not the sentinel passes.
pub fn validate_formatted(stored: &Value) -> Option<FailedValidation> {
    match stored {
        Value::String(s) if s == INVALID_RESPONSE => {
            info!("stored answer is the invalid-response sentinel, re-presenting page");
            Some(FailedValidation {
                message: "Your answer could not be read. Please set the slider again."
                    .to_string(),
            })
        }
        _ => None,
    }
}
