//! The built-in component catalogue.
//!
//! [`builtin`] registers the SPI bus, the Itho ecofan RF hub and its fan
//! platform, the `itho_ecofanrft.join` action and scripts to hold it.

pub mod base;
pub mod itho;
pub mod pin;
pub mod script;
pub mod spi;

use ecofan_emit::Catalogue;

/// Every component, platform and action ecofan ships.
pub fn builtin() -> Catalogue {
    let mut catalogue = Catalogue::new();
    catalogue.add_action(itho::join_action());

    catalogue.add_component(spi::definition());
    catalogue.add_component(itho::hub());
    catalogue.add_platform(base::FAN_DOMAIN, itho::fan_platform());

    // scripts accept every action registered above
    let actions = catalogue.action_schemas();
    catalogue.add_component(script::definition(actions));
    catalogue
}
