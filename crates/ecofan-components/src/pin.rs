//! GPIO pin parsers.
//!
//! A pin is written as `GPIO4`, `4`, or a mapping with `number` and the
//! optional `inverted` and `mode` keys. Every form normalises to the full
//! mapping so later stages see one shape.

use ecofan_core::ConfigNode;
use ecofan_schema::{CustomParser, FieldValue, ValueParser};

/// Highest pin number accepted.
pub const MAX_GPIO: i64 = 39;

pub const NUMBER_KEY: &str = "number";
pub const INVERTED_KEY: &str = "inverted";
pub const MODE_KEY: &str = "mode";

/// Modes for input pins; the first is the default.
pub const INPUT_MODES: &[&str] = &["input", "input_pullup", "input_pulldown"];
/// Modes for output pins; the first is the default.
pub const OUTPUT_MODES: &[&str] = &["output", "output_open_drain"];

/// Parser for a pin read by the component, such as an interrupt line.
pub fn input_pin() -> ValueParser {
    ValueParser::Custom(CustomParser::new("gpio_input_pin", |node| {
        parse_pin(node, INPUT_MODES)
    }))
}

/// Parser for a pin driven by the component, such as a chip select.
pub fn output_pin() -> ValueParser {
    ValueParser::Custom(CustomParser::new("gpio_output_pin", |node| {
        parse_pin(node, OUTPUT_MODES)
    }))
}

fn parse_pin(node: &ConfigNode, modes: &[&str]) -> Result<FieldValue, String> {
    let default_mode = modes.first().copied().unwrap_or("input");
    let (number, inverted, mode) = match node {
        ConfigNode::Mapping(options) => {
            if let Some(key) = options
                .keys()
                .find(|k| ![NUMBER_KEY, INVERTED_KEY, MODE_KEY].contains(k))
            {
                return Err(format!("unknown pin option `{key}`"));
            }
            let number = options
                .get(NUMBER_KEY)
                .ok_or("missing required field `number`")?;
            let inverted = match options.get(INVERTED_KEY) {
                None => false,
                Some(ConfigNode::Bool(b)) => *b,
                Some(other) => {
                    return Err(format!(
                        "pin `inverted` must be a boolean, found {}",
                        other.kind_name()
                    ))
                }
            };
            let mode = match options.get(MODE_KEY) {
                None => default_mode.to_string(),
                Some(ConfigNode::String(s)) => {
                    let mode = s.to_ascii_lowercase();
                    if !modes.contains(&mode.as_str()) {
                        return Err(format!(
                            "unknown pin mode '{mode}', expected one of: {}",
                            modes.join(", ")
                        ));
                    }
                    mode
                }
                Some(other) => {
                    return Err(format!(
                        "pin `mode` must be a string, found {}",
                        other.kind_name()
                    ))
                }
            };
            (number, inverted, mode)
        }
        scalar => (scalar, false, default_mode.to_string()),
    };

    let normalised = ConfigNode::mapping([
        (NUMBER_KEY, ConfigNode::Integer(pin_number(number)?)),
        (INVERTED_KEY, ConfigNode::Bool(inverted)),
        (MODE_KEY, ConfigNode::String(mode)),
    ])
    .map_err(|e| e.to_string())?;
    Ok(FieldValue::Node(normalised))
}

fn pin_number(node: &ConfigNode) -> Result<i64, String> {
    let number = match node {
        ConfigNode::Integer(n) => *n,
        ConfigNode::String(s) => {
            let text = s.trim();
            let digits = match text.get(..4) {
                Some(prefix) if prefix.eq_ignore_ascii_case("gpio") => &text[4..],
                _ => text,
            };
            digits
                .parse::<i64>()
                .map_err(|_| format!("invalid pin '{s}'"))?
        }
        other => return Err(format!("expected a pin, found {}", other.kind_name())),
    };
    if (0..=MAX_GPIO).contains(&number) {
        Ok(number)
    } else {
        Err(format!("pin number {number} is out of range [0, {MAX_GPIO}]"))
    }
}
