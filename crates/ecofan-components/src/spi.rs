//! The SPI bus.

use ecofan_emit::{ComponentDef, Registration, Role};
use ecofan_schema::{Schema, ValueParser, ID_KEY};

use crate::base::component_schema;
use crate::pin;

pub const DOMAIN: &str = "spi";
pub const CLASS: &str = "SPIComponent";

pub const CLK_PIN_KEY: &str = "clk_pin";
pub const MOSI_PIN_KEY: &str = "mosi_pin";
pub const MISO_PIN_KEY: &str = "miso_pin";

pub fn definition() -> ComponentDef {
    let schema = Schema::new()
        .generated(ID_KEY, ValueParser::declare_id(CLASS))
        .required(CLK_PIN_KEY, pin::output_pin())
        .optional(MOSI_PIN_KEY, pin::output_pin())
        .optional(MISO_PIN_KEY, pin::input_pin())
        .extend(&component_schema());
    ComponentDef::new(DOMAIN, CLASS, schema).register(Registration::with_fields(
        Role::Component,
        &[crate::base::SETUP_PRIORITY_KEY],
    ))
}
