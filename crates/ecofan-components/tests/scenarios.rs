//! Whole-document passes over the built-in catalogue.

use std::collections::HashSet;

use ecofan_components::{builtin, itho, spi};
use ecofan_core::{ConfigNode, Identifier, UintLiteral};
use ecofan_emit::{
    compile, Catalogue, ComponentDef, Construction, EmitError, Init, OpValue, Operation,
    PassOptions, PassOutput, Registration, Role,
};
use ecofan_schema::{ErrorKind, Schema, ValueParser, ID_KEY};

fn map(entries: Vec<(&str, ConfigNode)>) -> ConfigNode {
    ConfigNode::mapping(entries).unwrap()
}

fn seq(items: Vec<ConfigNode>) -> ConfigNode {
    ConfigNode::Sequence(items)
}

fn s(value: &str) -> ConfigNode {
    ConfigNode::from(value)
}

fn id(name: &str) -> Identifier {
    Identifier::new(name).unwrap()
}

fn spi_bus() -> (&'static str, ConfigNode) {
    (
        spi::DOMAIN,
        map(vec![
            ("clk_pin", s("GPIO18")),
            ("mosi_pin", s("GPIO23")),
            ("miso_pin", s("GPIO19")),
        ]),
    )
}

fn hub(name: Option<&str>, extra: Vec<(&str, ConfigNode)>) -> ConfigNode {
    let mut entries = Vec::new();
    if let Some(name) = name {
        entries.push(("id", s(name)));
    }
    entries.extend([
        ("irq_pin", s("GPIO4")),
        ("rf_address", s("01:02:03")),
        ("cs_pin", s("GPIO5")),
    ]);
    entries.extend(extra);
    map(entries)
}

fn fan(extra: Vec<(&str, ConfigNode)>) -> ConfigNode {
    let mut entries = vec![("platform", s(itho::DOMAIN)), ("name", s("Bathroom"))];
    entries.extend(extra);
    map(entries)
}

fn run(document: &ConfigNode) -> Result<PassOutput, EmitError> {
    compile(document, &builtin(), &PassOptions::default())
}

fn lines(out: &PassOutput) -> Vec<String> {
    out.operations.iter().map(ToString::to_string).collect()
}

fn assert_constructed_before_use(ops: &[Operation]) {
    let mut constructed = HashSet::new();
    for op in ops {
        match op {
            Operation::Construct { id, .. } => {
                constructed.insert(id.clone());
            }
            Operation::Expose { sub_id, .. } => {
                constructed.insert(sub_id.clone());
            }
            _ => {}
        }
        assert!(constructed.contains(op.subject()), "{op} before construction");
        for used in op.consumes() {
            assert!(constructed.contains(used), "{op} uses {used} before construction");
        }
    }
}

/// A hub and a fan platform with no extra fields, so the emitted program is minimal.
fn minimal_catalogue() -> Catalogue {
    let mut cat = Catalogue::new();
    cat.add_component(
        ComponentDef::new(
            "hub",
            "Hub",
            Schema::new()
                .generated(ID_KEY, ValueParser::declare_id("Hub"))
                .required("rf_address", ValueParser::Address)
                .optional("peer_rf_address", ValueParser::Address),
        )
        .register(Registration::new(Role::Component))
        .register(Registration::new(Role::SpiDevice)),
    );
    cat.add_platform(
        "fan",
        ComponentDef::new(
            "hub",
            "Fan",
            Schema::new()
                .generated(ID_KEY, ValueParser::declare_id("Fan"))
                .generated("hub_id", ValueParser::use_id("Hub")),
        )
        .constructed(Construction::FromParent {
            field: "hub_id".into(),
            accessor: "get_fan".into(),
        })
        .register(Registration::new(Role::FanEntity)),
    );
    cat
}

#[test]
fn hub_then_dependent_fan_emits_exact_program() {
    let document = map(vec![
        ("hub", map(vec![("id", s("hub")), ("rf_address", s("01:02:03"))])),
        ("fan", seq(vec![map(vec![("platform", s("hub")), ("id", s("dependent"))])])),
    ]);
    let out = compile(&document, &minimal_catalogue(), &PassOptions::default()).unwrap();

    assert_eq!(
        out.operations,
        vec![
            Operation::Construct {
                id: id("hub"),
                class: "Hub".into(),
                init: Init::New { args: vec![] },
            },
            Operation::SetField {
                id: id("hub"),
                field: "rf_address".into(),
                value: OpValue::Literal(UintLiteral::new(0x010203, 6)),
            },
            Operation::Register {
                id: id("hub"),
                role: Role::Component,
                args: vec![],
            },
            Operation::Register {
                id: id("hub"),
                role: Role::SpiDevice,
                args: vec![],
            },
            Operation::Construct {
                id: id("dependent"),
                class: "Fan".into(),
                init: Init::Exposed {
                    parent: id("hub"),
                    accessor: "get_fan".into(),
                },
            },
            Operation::Register {
                id: id("dependent"),
                role: Role::FanEntity,
                args: vec![],
            },
        ]
    );
    assert_eq!(out.report.suspensions, 0);
}

#[test]
fn peer_address_adds_exactly_one_field() {
    let document = map(vec![(
        "hub",
        map(vec![
            ("id", s("hub")),
            ("rf_address", s("01:02:03")),
            ("peer_rf_address", s("0a:0b:0c")),
        ]),
    )]);
    let out = compile(&document, &minimal_catalogue(), &PassOptions::default()).unwrap();
    assert_eq!(
        &lines(&out)[..4],
        &[
            "construct hub: Hub()",
            "set hub.rf_address = 0x010203",
            "set hub.peer_rf_address = 0x0A0B0C",
            "register hub as component",
        ]
    );
}

#[test]
fn full_document_lists_every_operation() {
    let document = map(vec![
        spi_bus(),
        (itho::DOMAIN, seq(vec![hub(Some("hub"), vec![])])),
        ("fan", seq(vec![fan(vec![("id", s("bath"))])])),
    ]);
    let out = run(&document).unwrap();
    assert_eq!(
        lines(&out),
        vec![
            "construct spicomponent_0: SPIComponent()",
            r#"set spicomponent_0.clk_pin = {number: 18, inverted: false, mode: "output"}"#,
            r#"set spicomponent_0.mosi_pin = {number: 23, inverted: false, mode: "output"}"#,
            r#"set spicomponent_0.miso_pin = {number: 19, inverted: false, mode: "input"}"#,
            "register spicomponent_0 as component",
            "construct hub: IthoEcoFanRftComponent()",
            r#"set hub.irq_pin = {number: 4, inverted: false, mode: "input"}"#,
            "set hub.rf_address = 0x010203",
            "register hub as component",
            r#"register hub as spi-device (spi_id=&spicomponent_0, cs_pin={number: 5, inverted: false, mode: "output"})"#,
            "construct bath: IthoEcoFanRftFan = hub.get_fan()",
            r#"register bath as fan-entity (name="Bathroom")"#,
        ]
    );
    assert_eq!(out.report.entries, 3);
    assert_eq!(out.report.identifiers, 3);
}

#[test]
fn reversed_document_still_constructs_before_use() {
    let document = map(vec![
        ("fan", seq(vec![fan(vec![])])),
        (itho::DOMAIN, hub(Some("hub"), vec![])),
        spi_bus(),
    ]);
    let out = run(&document).unwrap();
    assert_constructed_before_use(&out.operations);

    let constructs: Vec<String> = out
        .operations
        .iter()
        .filter_map(|op| match op {
            Operation::Construct { id, .. } => Some(id.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(
        constructs,
        vec!["spicomponent_0", "hub", "itho_eco_fan_rft_fan_0"]
    );
    assert_eq!(out.report.suspensions, 2);
}

#[test]
fn unknown_reference_names_identifier_and_path() {
    let document = map(vec![
        spi_bus(),
        (itho::DOMAIN, hub(Some("hub"), vec![])),
        ("fan", seq(vec![fan(vec![(itho::HUB_ID_KEY, s("ghost"))])])),
    ]);
    let err = run(&document).unwrap_err();
    assert!(matches!(&err, EmitError::UnknownIdentifier { id, .. } if id.as_str() == "ghost"));
    assert_eq!(
        err.to_string(),
        "fan[0].itho_ecofanrft_id: unknown identifier 'ghost'"
    );
}

#[test]
fn equal_peer_address_is_rejected_at_the_entry() {
    let document = map(vec![
        spi_bus(),
        (
            itho::DOMAIN,
            seq(vec![hub(None, vec![(itho::PEER_RF_ADDRESS_KEY, s("01:02:03"))])]),
        ),
    ]);
    let EmitError::Validation(report) = run(&document).unwrap_err() else {
        panic!("expected validation failure");
    };
    assert_eq!(report.len(), 1);
    assert_eq!(report.errors[0].kind, ErrorKind::Object);
    assert_eq!(report.errors[0].path.to_string(), "itho_ecofanrft[0]");
    assert!(report.errors[0].message.contains(itho::SAME_ADDRESS_MESSAGE));
}

#[test]
fn invalid_address_names_the_failed_check() {
    let document = map(vec![
        spi_bus(),
        (
            itho::DOMAIN,
            seq(vec![hub(None, vec![(itho::PEER_RF_ADDRESS_KEY, s("AA:BB:GG"))])]),
        ),
    ]);
    let EmitError::Validation(report) = run(&document).unwrap_err() else {
        panic!("expected validation failure");
    };
    assert_eq!(report.errors[0].kind, ErrorKind::InvalidFormat);
    assert_eq!(
        report.errors[0].to_string(),
        "itho_ecofanrft[0].peer_rf_address: RF Address parts must be hexadecimal values from 00 to FF"
    );
}

#[test]
fn single_hub_is_the_default_for_fans() {
    let document = map(vec![
        spi_bus(),
        (itho::DOMAIN, seq(vec![hub(None, vec![])])),
        ("fan", seq(vec![fan(vec![]), fan(vec![("name", s("Kitchen"))])])),
    ]);
    let out = run(&document).unwrap();
    let text = lines(&out);
    assert!(text.contains(&"construct itho_eco_fan_rft_component_0: IthoEcoFanRftComponent()".to_string()));
    assert!(text.contains(
        &"construct itho_eco_fan_rft_fan_0: IthoEcoFanRftFan = itho_eco_fan_rft_component_0.get_fan()"
            .to_string()
    ));
    assert!(text.contains(
        &"construct itho_eco_fan_rft_fan_1: IthoEcoFanRftFan = itho_eco_fan_rft_component_0.get_fan()"
            .to_string()
    ));
}

#[test]
fn two_hubs_make_the_default_ambiguous() {
    let document = map(vec![
        spi_bus(),
        (
            itho::DOMAIN,
            seq(vec![
                hub(None, vec![]),
                map(vec![
                    ("irq_pin", s("GPIO15")),
                    ("rf_address", s("04:05:06")),
                    ("cs_pin", s("GPIO16")),
                ]),
            ]),
        ),
        ("fan", seq(vec![fan(vec![])])),
    ]);
    let err = run(&document).unwrap_err();
    let EmitError::AmbiguousDefault { candidates, .. } = err else {
        panic!("expected ambiguous default, got {err}");
    };
    assert_eq!(
        candidates,
        vec![
            id("itho_eco_fan_rft_component_0"),
            id("itho_eco_fan_rft_component_1")
        ]
    );
}

#[test]
fn reference_to_wrong_class_is_rejected() {
    let document = map(vec![
        (spi::DOMAIN, map(vec![("id", s("bus")), ("clk_pin", s("GPIO18"))])),
        (itho::DOMAIN, hub(Some("hub"), vec![])),
        ("fan", fan(vec![(itho::HUB_ID_KEY, s("bus"))])),
    ]);
    let err = run(&document).unwrap_err();
    assert_eq!(
        err.to_string(),
        "fan.itho_ecofanrft_id: 'bus' is a SPIComponent, expected a IthoEcoFanRftComponent"
    );
}

#[test]
fn script_join_binds_to_hub_declared_later() {
    let join = |value: ConfigNode| map(vec![(itho::JOIN_ACTION, value)]);
    let document = map(vec![
        (
            "script",
            seq(vec![map(vec![
                ("id", s("pair")),
                (
                    "then",
                    seq(vec![join(s("hub")), join(map(vec![("id", s("hub"))]))]),
                ),
            ])]),
        ),
        spi_bus(),
        (itho::DOMAIN, hub(Some("hub"), vec![])),
    ]);
    let out = run(&document).unwrap();
    assert_constructed_before_use(&out.operations);

    let text = lines(&out);
    let start = text
        .iter()
        .position(|l| l == "construct pair: Script()")
        .unwrap();
    assert_eq!(
        &text[start..],
        &[
            "construct pair: Script()",
            "construct pair_action_0: JoinAction(&hub)",
            "construct pair_action_1: JoinAction(&hub)",
            "set pair.then = [&pair_action_0, &pair_action_1]",
            "register pair as script",
        ]
    );
    assert_eq!(out.report.identifiers, 5);
}

#[test]
fn unknown_action_is_a_validation_error() {
    let document = map(vec![(
        "script",
        seq(vec![map(vec![
            ("id", s("pair")),
            ("then", seq(vec![map(vec![("itho_ecofanrft.reset", s("hub"))])])),
        ])]),
    )]);
    let EmitError::Validation(report) = run(&document).unwrap_err() else {
        panic!("expected validation failure");
    };
    assert_eq!(
        report.errors[0].to_string(),
        "script[0].then[0].itho_ecofanrft.reset: unknown action 'itho_ecofanrft.reset'"
    );
}

#[test]
fn hub_without_spi_bus_is_rejected() {
    let document = map(vec![(itho::DOMAIN, hub(Some("hub"), vec![]))]);
    assert_eq!(
        run(&document).unwrap_err().to_string(),
        "itho_ecofanrft: component 'itho_ecofanrft' requires component 'spi'"
    );
}

#[test]
fn spi_bus_accepts_one_entry() {
    let (domain, bus) = spi_bus();
    let document = map(vec![(domain, seq(vec![bus.clone(), bus]))]);
    assert!(matches!(
        run(&document),
        Err(EmitError::MultipleEntries { .. })
    ));
}

/// Nodes built from the node named by `peer`.
fn node_catalogue() -> Catalogue {
    let mut cat = Catalogue::new();
    cat.add_component(
        ComponentDef::new(
            "node",
            "Node",
            Schema::new()
                .required(ID_KEY, ValueParser::declare_id("Node"))
                .optional("peer", ValueParser::use_id("Node")),
        )
        .constructed(Construction::FromParent {
            field: "peer".into(),
            accessor: "child".into(),
        })
        .multi_conf(),
    );
    cat
}

#[test]
fn mutual_references_are_a_cycle() {
    let document = map(vec![(
        "node",
        seq(vec![
            map(vec![("id", s("a")), ("peer", s("b"))]),
            map(vec![("id", s("b")), ("peer", s("a"))]),
        ]),
    )]);
    let err = compile(&document, &node_catalogue(), &PassOptions::default()).unwrap_err();
    let EmitError::CyclicDependency { cycle } = &err else {
        panic!("expected a cycle, got {err}");
    };
    let paths: Vec<String> = cycle.iter().map(|(_, path)| path.to_string()).collect();
    assert_eq!(paths, vec!["node[1].id", "node[0].id"]);
    assert_eq!(
        err.to_string(),
        "cyclic dependency between identifiers: b (node[1].id) -> a (node[0].id) -> b"
    );
}

#[test]
fn own_parent_is_a_cycle_of_one() {
    let document = map(vec![(
        "node",
        seq(vec![map(vec![("id", s("a")), ("peer", s("a"))])]),
    )]);
    let err = compile(&document, &node_catalogue(), &PassOptions::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cyclic dependency between identifiers: a (node[0].id) -> a"
    );
}

#[test]
fn generated_id_steps_around_an_explicit_one() {
    let document = map(vec![
        spi_bus(),
        (
            itho::DOMAIN,
            seq(vec![
                hub(None, vec![]),
                hub(Some("itho_eco_fan_rft_component_0"), vec![]),
            ]),
        ),
    ]);
    let out = run(&document).unwrap();
    let text = lines(&out);
    assert!(text.contains(
        &"construct itho_eco_fan_rft_component_1: IthoEcoFanRftComponent()".to_string()
    ));
    assert!(text.contains(
        &"construct itho_eco_fan_rft_component_0: IthoEcoFanRftComponent()".to_string()
    ));
    assert_eq!(out.report.identifiers, 3);
}

#[test]
fn action_ids_skip_names_the_document_uses() {
    let join = map(vec![(itho::JOIN_ACTION, s("hub"))]);
    let document = map(vec![
        spi_bus(),
        (itho::DOMAIN, hub(Some("hub"), vec![])),
        (
            "script",
            seq(vec![
                map(vec![("id", s("pair")), ("then", seq(vec![join.clone()]))]),
                map(vec![("id", s("pair_action_0")), ("then", seq(vec![join]))]),
            ]),
        ),
    ]);
    let text = lines(&run(&document).unwrap());
    assert!(text.contains(&"construct pair_action_1: JoinAction(&hub)".to_string()));
    assert!(text.contains(&"set pair.then = [&pair_action_1]".to_string()));
    assert!(text.contains(&"construct pair_action_0_action_0: JoinAction(&hub)".to_string()));
}

/// A hub that hands out a light, and a dimmer wired to that light.
fn light_catalogue() -> Catalogue {
    let mut cat = Catalogue::new();
    cat.add_component(
        ComponentDef::new(
            "light_hub",
            "LightHub",
            Schema::new()
                .required(ID_KEY, ValueParser::declare_id("LightHub"))
                .required("light_id", ValueParser::expose_id("Light", "get_light")),
        )
        .register(Registration::new(Role::Component)),
    );
    cat.add_component(
        ComponentDef::new(
            "dimmer",
            "Dimmer",
            Schema::new()
                .required(ID_KEY, ValueParser::declare_id("Dimmer"))
                .required("light", ValueParser::use_id("Light")),
        )
        .register(Registration::new(Role::Component)),
    );
    cat
}

#[test]
fn exposed_instance_is_usable_after_its_parent() {
    let dimmer = ("dimmer", map(vec![("id", s("dim")), ("light", s("lamp"))]));
    let light_hub = (
        "light_hub",
        map(vec![("id", s("lh")), ("light_id", s("lamp"))]),
    );
    let expected = [
        "construct lh: LightHub()",
        "register lh as component",
        "expose lamp: Light = lh.get_light()",
        "construct dim: Dimmer()",
        "set dim.light = &lamp",
        "register dim as component",
    ];

    let forward = map(vec![light_hub.clone(), dimmer.clone()]);
    let out = compile(&forward, &light_catalogue(), &PassOptions::default()).unwrap();
    assert_eq!(lines(&out), expected);
    assert_eq!(out.report.suspensions, 0);
    assert_eq!(out.report.operations.expose, 1);

    // the dimmer waits for the light, then resumes once the hub exposes it
    let backward = map(vec![dimmer, light_hub]);
    let out = compile(&backward, &light_catalogue(), &PassOptions::default()).unwrap();
    assert_constructed_before_use(&out.operations);
    assert_eq!(lines(&out), expected);
    assert_eq!(out.report.suspensions, 1);
}

#[test]
fn exposed_id_has_the_exposed_class() {
    let document = map(vec![
        ("light_hub", map(vec![("id", s("lh")), ("light_id", s("lamp"))])),
        ("dimmer", map(vec![("id", s("dim")), ("light", s("lh"))])),
    ]);
    let err = compile(&document, &light_catalogue(), &PassOptions::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "dimmer.light: 'lh' is a LightHub, expected a Light"
    );
}

#[test]
fn operations_serialize_with_tags() {
    let document = map(vec![
        spi_bus(),
        (itho::DOMAIN, hub(Some("hub"), vec![])),
    ]);
    let out = run(&document).unwrap();
    let json = serde_json::to_value(&out.operations).unwrap();
    assert_eq!(json[0]["op"], "construct");
    assert_eq!(json[0]["init"]["kind"], "new");
    let address = out
        .operations
        .iter()
        .position(|op| matches!(op, Operation::SetField { field, .. } if field == "rf_address"))
        .unwrap();
    assert_eq!(json[address]["value"]["kind"], "literal");
    assert_eq!(json[address]["value"]["value"]["value"], 0x010203);
}
