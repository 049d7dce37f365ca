//! Schemas shared by several components.

use ecofan_core::ConfigNode;
use ecofan_emit::PLATFORM_KEY;
use ecofan_schema::{CustomParser, FieldValue, Schema, ValueParser};

use crate::pin;
use crate::spi;

pub const SETUP_PRIORITY_KEY: &str = "setup_priority";
pub const SPI_ID_KEY: &str = "spi_id";
pub const CS_PIN_KEY: &str = "cs_pin";
pub const NAME_KEY: &str = "name";
pub const INTERNAL_KEY: &str = "internal";

/// The domain fan platforms are written under.
pub const FAN_DOMAIN: &str = "fan";

/// Fields every component with a setup/loop lifecycle accepts.
pub fn component_schema() -> Schema {
    Schema::new().optional(SETUP_PRIORITY_KEY, float())
}

/// Fields of a device attached to the SPI bus.
pub fn spi_device_schema() -> Schema {
    Schema::new()
        .generated(SPI_ID_KEY, ValueParser::use_id(spi::CLASS))
        .required(CS_PIN_KEY, pin::output_pin())
}

/// Fields every fan platform accepts.
pub fn fan_schema() -> Schema {
    Schema::new()
        .required(PLATFORM_KEY, ValueParser::String)
        .required(NAME_KEY, ValueParser::String)
        .optional(INTERNAL_KEY, ValueParser::Boolean)
}

/// A number, integers widened to floats.
pub fn float() -> ValueParser {
    ValueParser::Custom(CustomParser::new("float", |node| match node {
        ConfigNode::Float(x) => Ok(FieldValue::Node(ConfigNode::Float(*x))),
        ConfigNode::Integer(n) => Ok(FieldValue::Node(ConfigNode::Float(*n as f64))),
        other => Err(format!("expected a number, found {}", other.kind_name())),
    }))
}
