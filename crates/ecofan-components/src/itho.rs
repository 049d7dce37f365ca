//! The Itho ecofan RF hub, its fan platform and the join action.
//!
//! The hub is a CC1101 transceiver on the SPI bus that talks to Itho
//! ventilation units at a 3-byte RF address. Each fan entity is owned by a
//! hub and obtained from it, not constructed on its own.

use ecofan_emit::{ActionDef, ComponentDef, Construction, Registration, Role};
use ecofan_schema::{ObjectCheck, Schema, ValueParser, ID_KEY};

use crate::base::{self, component_schema, fan_schema, spi_device_schema};
use crate::{pin, spi};

pub const DOMAIN: &str = "itho_ecofanrft";
pub const HUB_CLASS: &str = "IthoEcoFanRftComponent";
pub const FAN_CLASS: &str = "IthoEcoFanRftFan";

pub const JOIN_ACTION: &str = "itho_ecofanrft.join";
pub const JOIN_CLASS: &str = "JoinAction";

pub const IRQ_PIN_KEY: &str = "irq_pin";
pub const RF_ADDRESS_KEY: &str = "rf_address";
pub const PEER_RF_ADDRESS_KEY: &str = "peer_rf_address";
/// The reference from a fan entry to its hub.
pub const HUB_ID_KEY: &str = "itho_ecofanrft_id";

/// Hub method returning the fan it controls.
pub const GET_FAN: &str = "get_fan";

pub const SAME_ADDRESS_MESSAGE: &str = "RF address cannot be the same as peer RF address!";

/// The hub schema: own fields, then component fields, then SPI device fields.
pub fn hub_schema() -> Schema {
    Schema::new()
        .generated(ID_KEY, ValueParser::declare_id(HUB_CLASS))
        .required(IRQ_PIN_KEY, pin::input_pin())
        .required(RF_ADDRESS_KEY, ValueParser::Address)
        .optional(PEER_RF_ADDRESS_KEY, ValueParser::Address)
        .extend(&component_schema())
        .extend(&spi_device_schema())
        .check(ObjectCheck::distinct(
            PEER_RF_ADDRESS_KEY,
            RF_ADDRESS_KEY,
            SAME_ADDRESS_MESSAGE,
        ))
}

pub fn hub() -> ComponentDef {
    ComponentDef::new(DOMAIN, HUB_CLASS, hub_schema())
        .register(Registration::with_fields(
            Role::Component,
            &[base::SETUP_PRIORITY_KEY],
        ))
        .register(Registration::with_fields(
            Role::SpiDevice,
            &[base::SPI_ID_KEY, base::CS_PIN_KEY],
        ))
        .multi_conf()
        .depends_on(spi::DOMAIN)
}

/// The `itho_ecofanrft` platform of the `fan` domain.
pub fn fan_platform() -> ComponentDef {
    let schema = fan_schema().extend(
        &Schema::new()
            .generated(ID_KEY, ValueParser::declare_id(FAN_CLASS))
            .generated(HUB_ID_KEY, ValueParser::use_id(HUB_CLASS)),
    );
    ComponentDef::new(DOMAIN, FAN_CLASS, schema)
        .constructed(Construction::FromParent {
            field: HUB_ID_KEY.to_string(),
            accessor: GET_FAN.to_string(),
        })
        .register(Registration::with_fields(Role::FanEntity, &[base::NAME_KEY]))
        .depends_on(DOMAIN)
}

/// `itho_ecofanrft.join: <hub>` puts the hub into pairing mode.
pub fn join_action() -> ActionDef {
    ActionDef::new(
        JOIN_ACTION,
        JOIN_CLASS,
        Schema::new().required(ID_KEY, ValueParser::use_id(HUB_CLASS)),
    )
}
