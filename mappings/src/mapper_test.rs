use super::*;
use crate::flow::FlowSteps;
use crate::model::{Action, ActionDescriptor, StepKind};

// =============================================================
// Helpers
// =============================================================

type Mapper = ResponseCodeMapper<FlowSteps>;

fn new_mapper() -> (Mapper, UnboundedReceiver<MapperEvent>) {
    ResponseCodeMapper::new(FlowSteps::default(), MapperConfig::default())
}

fn endpoint(errors: &[&str]) -> Step {
    Step {
        id: None,
        step_kind: Some(StepKind::Endpoint),
        action: Some(Action {
            descriptor: Some(ActionDescriptor {
                standardized_errors: Some(errors.iter().map(|n| StandardizedError::new(*n)).collect()),
            }),
            ..Action::default()
        }),
    }
}

fn raw(primary_code: Option<i64>, rules: Vec<Rule>) -> RawConfiguration {
    RawConfiguration { primary_code, rules: Some(RulesInput::Structured(rules)) }
}

fn sample() -> RawConfiguration {
    raw(Some(200), vec![Rule::new("404", ["NOT_FOUND"])])
}

fn tag(name: &str) -> StandardizedError {
    StandardizedError::new(name)
}

// =============================================================
// load
// =============================================================

#[test]
fn load_none_yields_empty_rules_and_blank_code() {
    let (mut mapper, mut rx) = new_mapper();
    mapper.load(None);

    assert_eq!(mapper.phase(), Phase::Ready);
    assert_eq!(mapper.rule_count(), 0);
    assert_eq!(mapper.primary_code_input(), "");
    assert!(!mapper.is_valid());
    assert_eq!(drain_events(&mut rx), vec![MapperEvent::ValidityChanged(false)]);
}

#[test]
fn load_builds_one_group_per_rule() {
    let (mut mapper, mut rx) = new_mapper();
    mapper.load(Some(&sample()));

    assert_eq!(mapper.rule_count(), 1);
    assert_eq!(mapper.current_rules(), vec![Rule::new("404", ["NOT_FOUND"])]);
    assert_eq!(mapper.primary_code_input(), "200");
    assert!(mapper.is_valid());
    assert_eq!(drain_events(&mut rx), vec![MapperEvent::ValidityChanged(true)]);
}

#[test]
fn load_then_serialize_round_trips() {
    let configurations = [
        Configuration::default(),
        Configuration { primary_code: 0, rules: vec![] },
        Configuration {
            primary_code: 204,
            rules: vec![
                Rule { discriminant: String::new(), tags: None },
                Rule::new("409", ["CONFLICT", "DUPLICATE"]),
                Rule::new("409", Vec::<String>::new()),
            ],
        },
    ];
    for cfg in configurations {
        let (mut mapper, _rx) = new_mapper();
        mapper.load(Some(&RawConfiguration::from(cfg.clone())));
        assert_eq!(mapper.serialize().unwrap(), cfg);
    }
}

#[test]
fn load_decodes_encoded_rules() {
    let (mut mapper, _rx) = new_mapper();
    let input = RawConfiguration {
        primary_code: Some(200),
        rules: Some(RulesInput::Encoded(r#"[{"status":"400","errors":["BAD_REQUEST"]}]"#.into())),
    };
    mapper.load(Some(&input));
    assert_eq!(mapper.current_rules(), vec![Rule::new("400", ["BAD_REQUEST"])]);
}

#[test]
fn load_falls_back_to_empty_on_malformed_encoded_rules() {
    let (mut mapper, _rx) = new_mapper();
    let input = RawConfiguration { primary_code: Some(200), rules: Some(RulesInput::Encoded("[{oops".into())) };
    mapper.load(Some(&input));
    assert_eq!(mapper.phase(), Phase::Ready);
    assert_eq!(mapper.rule_count(), 0);
    assert!(mapper.is_valid());
}

#[test]
fn load_ignores_encoded_rules_when_disabled() {
    let config = MapperConfig { accept_encoded_rules: false, ..MapperConfig::default() };
    let (mut mapper, _rx) = ResponseCodeMapper::new(FlowSteps::default(), config);
    let input = RawConfiguration {
        primary_code: Some(200),
        rules: Some(RulesInput::Encoded(r#"[{"status":"400"}]"#.into())),
    };
    mapper.load(Some(&input));
    assert_eq!(mapper.rule_count(), 0);
}

#[test]
fn reload_replaces_the_listener() {
    let (mut mapper, _rx) = new_mapper();
    mapper.load(Some(&sample()));
    mapper.load(Some(&sample()));
    assert!(mapper.has_listener());
    assert_eq!(mapper.form().map(Form::listener_count), Some(1));
}

// =============================================================
// decode_encoded_rules
// =============================================================

#[test]
fn decode_encoded_rules_policies() {
    assert!(decode_encoded_rules("  ", true).unwrap().is_empty());
    assert!(matches!(decode_encoded_rules("[]", false), Err(MapperError::EncodedRulesRejected)));
    assert!(matches!(decode_encoded_rules("nope", true), Err(MapperError::RulesDecode(_))));
}

// =============================================================
// on_external_input_changed
// =============================================================

#[test]
fn first_position_triggers_load_with_current_configuration() {
    let (mut mapper, _rx) = new_mapper();
    let reloaded = mapper.on_external_input_changed([
        InputChange::Configuration(Some(sample())),
        InputChange::Position(3),
    ]);
    assert!(reloaded);
    assert_eq!(mapper.position(), Some(3));
    assert_eq!(mapper.rule_count(), 1);
}

#[test]
fn same_position_does_not_reload() {
    let (mut mapper, mut rx) = new_mapper();
    mapper.on_external_input_changed([InputChange::Configuration(Some(sample())), InputChange::Position(3)]);
    mapper.toggle_tag_assignment(&tag("TIMEOUT"), 0).unwrap();
    drain_events(&mut rx);

    let reloaded = mapper.on_external_input_changed([InputChange::Position(3)]);
    assert!(!reloaded);
    assert!(mapper.is_tag_assigned(&tag("TIMEOUT"), 0));
    assert!(drain_events(&mut rx).is_empty());
}

#[test]
fn changed_position_reloads() {
    let (mut mapper, mut rx) = new_mapper();
    mapper.on_external_input_changed([InputChange::Configuration(Some(sample())), InputChange::Position(3)]);
    mapper.toggle_tag_assignment(&tag("TIMEOUT"), 0).unwrap();
    drain_events(&mut rx);

    let reloaded = mapper.on_external_input_changed([InputChange::Position(4)]);
    assert!(reloaded);
    assert!(!mapper.is_tag_assigned(&tag("TIMEOUT"), 0));
    assert_eq!(drain_events(&mut rx), vec![MapperEvent::ValidityChanged(true)]);
}

#[test]
fn configuration_and_validity_changes_alone_do_not_reload() {
    let (mut mapper, _rx) = new_mapper();
    mapper.on_external_input_changed([InputChange::Configuration(Some(sample())), InputChange::Position(1)]);

    let other = raw(Some(500), vec![]);
    let reloaded =
        mapper.on_external_input_changed([InputChange::Configuration(Some(other.clone())), InputChange::Valid(false)]);
    assert!(!reloaded);
    assert_eq!(mapper.rule_count(), 1);
    assert_eq!(mapper.configuration(), Some(&other));
    assert!(!mapper.is_valid());
}

// =============================================================
// initialize
// =============================================================

#[test]
fn initialize_collects_known_errors_and_step() {
    let mut log_step = endpoint(&["IGNORED"]);
    log_step.step_kind = Some(StepKind::Log);
    let steps = FlowSteps(vec![
        endpoint(&["START_ONLY"]),
        endpoint(&["NOT_FOUND", "TIMEOUT"]),
        log_step,
        endpoint(&["TIMEOUT", "SERVER_ERROR"]),
        Step { id: Some("mapper-step".into()), ..Step::default() },
    ]);

    let (mut mapper, _rx) = ResponseCodeMapper::new(steps, MapperConfig::default());
    mapper.on_external_input_changed([InputChange::Position(4)]);
    mapper.initialize();

    let names: Vec<&str> = mapper.known_errors().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["NOT_FOUND", "SERVER_ERROR", "TIMEOUT"]);
    assert_eq!(mapper.step().and_then(|s| s.id.as_deref()), Some("mapper-step"));
}

#[test]
fn initialize_offers_neither_start_nor_own_step_errors() {
    let steps = FlowSteps(vec![endpoint(&["START_ONLY"]), endpoint(&["NOT_FOUND"]), endpoint(&["SELF_ONLY"])]);
    let (mut mapper, _rx) = ResponseCodeMapper::new(steps, MapperConfig::default());
    mapper.on_external_input_changed([InputChange::Position(2)]);
    mapper.initialize();

    let names: Vec<&str> = mapper.known_errors().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["NOT_FOUND"]);
}

#[test]
fn initialize_without_position_uses_middle_steps() {
    let steps = FlowSteps(vec![endpoint(&["START"]), endpoint(&["A"]), endpoint(&["END"])]);
    let (mut mapper, _rx) = ResponseCodeMapper::new(steps, MapperConfig::default());
    mapper.initialize();
    assert!(mapper.step().is_none());
    let names: Vec<&str> = mapper.known_errors().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["A"]);
}

#[test]
fn set_context_is_picked_up_by_next_initialize() {
    let (mut mapper, _rx) = ResponseCodeMapper::new(
        FlowSteps(vec![Step::default(), endpoint(&["OLD"]), Step::default()]),
        MapperConfig::default(),
    );
    mapper.on_external_input_changed([InputChange::Position(2)]);
    mapper.initialize();
    assert!(mapper.known_errors().contains("OLD"));

    mapper.set_context(FlowSteps(vec![Step::default(), endpoint(&["NEW"]), Step::default()]));
    assert!(mapper.known_errors().contains("OLD"));
    mapper.initialize();
    assert!(!mapper.known_errors().contains("OLD"));
    assert!(mapper.known_errors().contains("NEW"));
}

// =============================================================
// dispose
// =============================================================

#[test]
fn dispose_is_idempotent_and_safe_before_load() {
    let (mut mapper, _rx) = new_mapper();
    mapper.dispose();
    mapper.dispose();
    assert_eq!(mapper.phase(), Phase::Disposed);
    assert!(!mapper.has_listener());
}

#[test]
fn dispose_releases_listener_and_blocks_reload() {
    let (mut mapper, mut rx) = new_mapper();
    mapper.load(Some(&sample()));
    drain_events(&mut rx);

    mapper.dispose();
    assert_eq!(mapper.form().map(Form::listener_count), Some(0));

    mapper.toggle_tag_assignment(&tag("TIMEOUT"), 0).unwrap();
    assert!(drain_events(&mut rx).is_empty());

    assert!(!mapper.on_external_input_changed([InputChange::Position(9)]));
    assert_eq!(mapper.phase(), Phase::Disposed);
}

// =============================================================
// is_tag_assigned / toggle_tag_assignment
// =============================================================

#[test]
fn is_tag_assigned_false_for_unset_and_out_of_range() {
    let (mut mapper, _rx) = new_mapper();
    assert!(!mapper.is_tag_assigned(&tag("X"), 0));

    mapper.load(Some(&raw(Some(200), vec![Rule { discriminant: "400".into(), tags: None }])));
    assert!(!mapper.is_tag_assigned(&tag("X"), 0));
    assert!(!mapper.is_tag_assigned(&tag("X"), 5));
}

#[test]
fn toggle_on_unset_tags_creates_single_entry() {
    let (mut mapper, _rx) = new_mapper();
    mapper.load(Some(&raw(Some(200), vec![Rule { discriminant: "400".into(), tags: None }])));

    mapper.toggle_tag_assignment(&tag("BAD_REQUEST"), 0).unwrap();
    assert!(mapper.is_tag_assigned(&tag("BAD_REQUEST"), 0));
    assert_eq!(mapper.current_rules()[0].tags, Some(vec!["BAD_REQUEST".to_owned()]));
}

#[test]
fn toggle_twice_restores_original_tags() {
    let (mut mapper, _rx) = new_mapper();
    mapper.load(Some(&sample()));
    let before = mapper.current_rules();

    mapper.toggle_tag_assignment(&tag("TIMEOUT"), 0).unwrap();
    mapper.toggle_tag_assignment(&tag("TIMEOUT"), 0).unwrap();
    assert_eq!(mapper.current_rules(), before);

    mapper.toggle_tag_assignment(&tag("NOT_FOUND"), 0).unwrap();
    mapper.toggle_tag_assignment(&tag("NOT_FOUND"), 0).unwrap();
    assert_eq!(mapper.current_rules(), before);
}

#[test]
fn toggle_removes_only_first_exact_match() {
    let (mut mapper, _rx) = new_mapper();
    mapper.load(Some(&raw(Some(200), vec![Rule::new("500", ["A", "a", "A"])])));

    mapper.toggle_tag_assignment(&tag("A"), 0).unwrap();
    assert_eq!(mapper.current_rules()[0].tag_slice(), ["a", "A"]);
}

#[test]
fn toggle_emits_one_validity_event() {
    let (mut mapper, mut rx) = new_mapper();
    mapper.load(Some(&sample()));
    drain_events(&mut rx);

    mapper.toggle_tag_assignment(&tag("TIMEOUT"), 0).unwrap();
    assert_eq!(drain_events(&mut rx), vec![MapperEvent::ValidityChanged(true)]);
}

#[test]
fn toggle_rejects_unknown_rule_and_unloaded_form() {
    let (mut mapper, _rx) = new_mapper();
    assert!(matches!(mapper.toggle_tag_assignment(&tag("X"), 0), Err(MapperError::NotLoaded)));

    mapper.load(Some(&sample()));
    assert!(matches!(
        mapper.toggle_tag_assignment(&tag("X"), 2),
        Err(MapperError::RuleIndexOutOfRange { index: 2, len: 1 })
    ));
}

// =============================================================
// on_form_changed
// =============================================================

#[test]
fn on_form_changed_emits_configuration_when_valid() {
    let (mut mapper, mut rx) = new_mapper();
    mapper.load(Some(&sample()));
    mapper.toggle_tag_assignment(&tag("TIMEOUT"), 0).unwrap();
    drain_events(&mut rx);

    mapper.on_form_changed();
    assert_eq!(
        drain_events(&mut rx),
        vec![
            MapperEvent::ValidityChanged(true),
            MapperEvent::ConfigurationChanged(Configuration {
                primary_code: 200,
                rules: vec![Rule::new("404", ["NOT_FOUND", "TIMEOUT"])],
            }),
        ]
    );
}

#[test]
fn on_form_changed_only_reports_invalidity_when_code_missing() {
    let (mut mapper, mut rx) = new_mapper();
    mapper.load(Some(&raw(None, vec![Rule::new("404", ["NOT_FOUND"])])));
    drain_events(&mut rx);

    mapper.on_form_changed();
    assert_eq!(drain_events(&mut rx), vec![MapperEvent::ValidityChanged(false)]);
}

#[test]
fn on_form_changed_before_load_is_silent() {
    let (mut mapper, mut rx) = new_mapper();
    mapper.on_form_changed();
    assert!(drain_events(&mut rx).is_empty());
}

// =============================================================
// set_primary_code / set_discriminant
// =============================================================

#[test]
fn primary_code_edits_drive_validity() {
    let (mut mapper, mut rx) = new_mapper();
    mapper.load(Some(&sample()));
    drain_events(&mut rx);

    mapper.set_primary_code("").unwrap();
    mapper.set_primary_code("abc").unwrap();
    mapper.set_primary_code(" 201 ").unwrap();
    assert_eq!(
        drain_events(&mut rx),
        vec![
            MapperEvent::ValidityChanged(false),
            MapperEvent::ValidityChanged(false),
            MapperEvent::ValidityChanged(true),
        ]
    );
    assert_eq!(mapper.serialize().unwrap().primary_code, 201);
}

#[test]
fn serialize_rejects_non_integer_code() {
    let (mut mapper, _rx) = new_mapper();
    mapper.load(Some(&sample()));
    mapper.set_primary_code("2xx").unwrap();
    assert!(matches!(mapper.serialize(), Err(MapperError::InvalidPrimaryCode(code)) if code == "2xx"));
}

#[test]
fn discriminant_edits_are_serialized() {
    let (mut mapper, _rx) = new_mapper();
    mapper.load(Some(&sample()));
    mapper.set_discriminant(0, "410").unwrap();
    assert_eq!(mapper.serialize().unwrap().rules, vec![Rule::new("410", ["NOT_FOUND"])]);
    assert!(mapper.set_discriminant(1, "500").is_err());
}

#[test]
fn events_after_receiver_dropped_are_discarded() {
    let (mut mapper, rx) = new_mapper();
    drop(rx);
    mapper.load(Some(&sample()));
    mapper.on_form_changed();
    assert!(mapper.is_valid());
}

#[test]
fn drain_events_returns_queued_events_in_order_and_empties_channel() {
    let (mut mapper, mut rx) = new_mapper();
    mapper.load(Some(&sample()));
    mapper.on_form_changed();

    let drained = drain_events(&mut rx);
    assert_eq!(drained.len(), 3);
    assert_eq!(drained[0], MapperEvent::ValidityChanged(true));
    assert_eq!(drained[1], MapperEvent::ValidityChanged(true));
    assert!(matches!(drained[2], MapperEvent::ConfigurationChanged(_)));
    assert!(drain_events(&mut rx).is_empty());
}
