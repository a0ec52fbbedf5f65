//! Synchronizer between a response-code configuration and its edit form.
//!
//! ARCHITECTURE
//! ============
//! The host owns the [`RawConfiguration`] and an opaque position token; the
//! synchronizer owns the form built from them. Data flows one way in each
//! direction:
//!
//! - host → form: [`ResponseCodeMapper::on_external_input_changed`] rebuilds
//!   the form whenever the position changes,
//! - form → host: [`MapperEvent`]s on an unbounded channel, emitted on every
//!   form write (`ValidityChanged`) and on explicit commits
//!   (`ConfigurationChanged`, only while the form is valid).
//!
//! LIFECYCLE
//! =========
//! `Uninitialized → Loading → Ready`, back to `Loading` whenever the position
//! changes, and `Disposed` once torn down. Exactly one form listener is live
//! at a time; `load` releases the previous one before registering the next.

#[cfg(test)]
#[path = "mapper_test.rs"]
mod mapper_test;

use std::cell::Cell;
use std::rc::Rc;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::config::MapperConfig;
use crate::error::MapperError;
use crate::flow::{FlowContext, KnownErrors};
use crate::form::{FieldSpec, FieldValue, Form, FormControl, FormNode, Segment, Validator, build_form};
use crate::model::{Configuration, RawConfiguration, Rule, RulesInput, StandardizedError, Step};
use crate::notify::Subscription;

pub const PRIMARY_CODE_FIELD: &str = "httpResponseCode";
pub const RULES_FIELD: &str = "errorResponseCodes";
pub const STATUS_FIELD: &str = "status";
pub const ERRORS_FIELD: &str = "errors";

/// Lifecycle position of a synchronizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Disposed,
}

/// An input property reassigned by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputChange {
    Configuration(Option<RawConfiguration>),
    /// Identity token: a different value means a different underlying step.
    Position(usize),
    /// Validity pushed back down by a two-way binding.
    Valid(bool),
}

/// Outbound notification to the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapperEvent {
    ValidityChanged(bool),
    ConfigurationChanged(Configuration),
}

/// Keeps a response-code configuration and its edit form in sync.
#[derive(Debug)]
pub struct ResponseCodeMapper<C> {
    context: C,
    config: MapperConfig,
    events: UnboundedSender<MapperEvent>,
    configuration: Option<RawConfiguration>,
    position: Option<usize>,
    valid: Rc<Cell<bool>>,
    step: Option<Step>,
    known_errors: KnownErrors,
    form: Option<Form>,
    listener: Option<Subscription>,
    phase: Phase,
}

impl<C: FlowContext> ResponseCodeMapper<C> {
    /// Create a synchronizer reading flow data from `context`. Events are
    /// delivered on the returned receiver.
    pub fn new(context: C, config: MapperConfig) -> (Self, UnboundedReceiver<MapperEvent>) {
        let (events, receiver) = mpsc::unbounded();
        let mapper = Self {
            context,
            config,
            events,
            configuration: None,
            position: None,
            valid: Rc::new(Cell::new(false)),
            step: None,
            known_errors: KnownErrors::default(),
            form: None,
            listener: None,
            phase: Phase::Uninitialized,
        };
        (mapper, receiver)
    }

    /// Rebuild the form from `configuration` (absent is treated as empty) and
    /// register a fresh change listener.
    pub fn load(&mut self, configuration: Option<&RawConfiguration>) {
        if self.phase == Phase::Disposed {
            log::debug!("response-code mapper: load after dispose ignored");
            return;
        }
        self.release_listener();

        let rules = configuration
            .and_then(|c| c.rules.as_ref())
            .map(|input| self.decode_rules(input))
            .unwrap_or_default();
        // Empty text rather than 0 so an unset code fails `Required`.
        let primary = configuration
            .and_then(|c| c.primary_code)
            .map_or_else(|| FieldValue::Text(String::new()), FieldValue::Integer);

        let form = build_form(form_spec(primary, &rules));

        let valid = Rc::clone(&self.valid);
        let events = self.events.clone();
        self.listener = Some(form.subscribe(move |change| {
            valid.set(change.valid);
            emit(&events, MapperEvent::ValidityChanged(change.valid));
        }));

        let initially_valid = form.valid();
        self.valid.set(initially_valid);
        self.form = Some(form);
        self.phase = Phase::Ready;
        log::debug!("response-code mapper: loaded {} rule(s), valid={initially_valid}", rules.len());
        emit(&self.events, MapperEvent::ValidityChanged(initially_valid));
    }

    /// Apply reassigned host inputs. Reloads only when the position actually
    /// changed; returns whether a reload happened.
    pub fn on_external_input_changed(&mut self, changes: impl IntoIterator<Item = InputChange>) -> bool {
        if self.phase == Phase::Disposed {
            log::debug!("response-code mapper: input change after dispose ignored");
            return false;
        }

        let mut reload = false;
        for change in changes {
            match change {
                InputChange::Configuration(configuration) => self.configuration = configuration,
                InputChange::Valid(valid) => self.valid.set(valid),
                InputChange::Position(position) => {
                    if self.position != Some(position) {
                        self.position = Some(position);
                        reload = true;
                    }
                }
            }
        }
        if !reload {
            return false;
        }

        self.phase = Phase::Loading;
        let configuration = self.configuration.clone();
        self.load(configuration.as_ref());
        true
    }

    /// Read the configured step and collect the error categories raised by
    /// endpoint steps upstream of it. The flow's start step is never offered.
    pub fn initialize(&mut self) {
        self.step = self
            .position
            .and_then(|position| self.context.step_at(position))
            .cloned();
        self.known_errors = KnownErrors::from_steps(self.context.upstream_steps(self.position));
        log::debug!("response-code mapper: {} known error categories", self.known_errors.len());
    }

    /// Swap in a newer view of the flow. Takes effect on the next
    /// [`Self::initialize`]; the form is left untouched.
    pub fn set_context(&mut self, context: C) {
        self.context = context;
    }

    /// Release the form listener. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.release_listener();
        self.phase = Phase::Disposed;
    }

    /// Whether `tag` is assigned to the rule at `index`. False for unset tag
    /// lists and out-of-range indices.
    #[must_use]
    pub fn is_tag_assigned(&self, tag: &StandardizedError, index: usize) -> bool {
        self.tags_at(index)
            .is_some_and(|tags| tags.iter().any(|assigned| *assigned == tag.name))
    }

    /// Assign `tag` to the rule at `index`, or unassign it if already present.
    ///
    /// Only the rule's `errors` control is written, so listeners see a single
    /// change.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::NotLoaded`] before `load` and
    /// [`MapperError::RuleIndexOutOfRange`] for an unknown rule.
    pub fn toggle_tag_assignment(&mut self, tag: &StandardizedError, index: usize) -> Result<(), MapperError> {
        let form = self.form.as_mut().ok_or(MapperError::NotLoaded)?;
        check_index(form, index)?;

        let path = errors_path(index);
        let next = match form.control(&path).map(FormControl::value) {
            Some(FieldValue::List(current)) => {
                let mut next = current.clone();
                match next.iter().position(|assigned| *assigned == tag.name) {
                    Some(pos) => {
                        next.remove(pos);
                    }
                    None => next.push(tag.name.clone()),
                }
                next
            }
            _ => vec![tag.name.clone()],
        };
        form.set_value(&path, FieldValue::List(next))
    }

    /// Write text typed into the primary code input.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::NotLoaded`] before `load`.
    pub fn set_primary_code(&mut self, raw: &str) -> Result<(), MapperError> {
        let form = self.form.as_mut().ok_or(MapperError::NotLoaded)?;
        form.set_value(&[PRIMARY_CODE_FIELD.into()], FieldValue::from_input(raw))
    }

    /// Write text typed into the status input of the rule at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::NotLoaded`] before `load` and
    /// [`MapperError::RuleIndexOutOfRange`] for an unknown rule.
    pub fn set_discriminant(&mut self, index: usize, raw: &str) -> Result<(), MapperError> {
        let form = self.form.as_mut().ok_or(MapperError::NotLoaded)?;
        check_index(form, index)?;
        form.set_value(
            &[RULES_FIELD.into(), Segment::Index(index), STATUS_FIELD.into()],
            FieldValue::Text(raw.to_owned()),
        )
    }

    /// Commit point: emit validity, and the serialized configuration when the
    /// form is valid.
    pub fn on_form_changed(&mut self) {
        let Some(form) = self.form.as_ref() else {
            log::debug!("response-code mapper: change before load ignored");
            return;
        };

        let valid = form.valid();
        self.valid.set(valid);
        emit(&self.events, MapperEvent::ValidityChanged(valid));
        if !valid {
            return;
        }

        match self.serialize() {
            Ok(configuration) => emit(&self.events, MapperEvent::ConfigurationChanged(configuration)),
            Err(e) => log::warn!("response-code mapper: valid form failed to serialize: {e}"),
        }
    }

    /// Project the form back into configuration shape.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::NotLoaded`] before `load` and
    /// [`MapperError::InvalidPrimaryCode`] when the primary code is not an
    /// integer.
    pub fn serialize(&self) -> Result<Configuration, MapperError> {
        let form = self.form.as_ref().ok_or(MapperError::NotLoaded)?;
        let primary_code = match form.control(&[PRIMARY_CODE_FIELD.into()]).map(FormControl::value) {
            Some(FieldValue::Integer(code)) => *code,
            Some(FieldValue::Text(text)) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| MapperError::InvalidPrimaryCode(text.clone()))?,
            Some(other) => return Err(MapperError::InvalidPrimaryCode(other.display())),
            None => return Err(MapperError::PathNotFound(PRIMARY_CODE_FIELD.to_owned())),
        };
        Ok(Configuration { primary_code, rules: rules_from_form(form) })
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid.get()
    }

    #[must_use]
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    #[must_use]
    pub fn configuration(&self) -> Option<&RawConfiguration> {
        self.configuration.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Step at the current position, as read by [`Self::initialize`].
    #[must_use]
    pub fn step(&self) -> Option<&Step> {
        self.step.as_ref()
    }

    #[must_use]
    pub fn known_errors(&self) -> &KnownErrors {
        &self.known_errors
    }

    #[must_use]
    pub fn form(&self) -> Option<&Form> {
        self.form.as_ref()
    }

    #[must_use]
    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    /// Text for the primary code input.
    #[must_use]
    pub fn primary_code_input(&self) -> String {
        self.form
            .as_ref()
            .and_then(|form| form.control(&[PRIMARY_CODE_FIELD.into()]))
            .map(|control| control.value().display())
            .unwrap_or_default()
    }

    /// Rules as currently edited, whether or not the form is valid.
    #[must_use]
    pub fn current_rules(&self) -> Vec<Rule> {
        self.form.as_ref().map(rules_from_form).unwrap_or_default()
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.form.as_ref().map_or(0, rule_count)
    }

    fn tags_at(&self, index: usize) -> Option<&[String]> {
        self.form
            .as_ref()?
            .control(&errors_path(index))?
            .value()
            .as_list()
    }

    fn decode_rules(&self, input: &RulesInput) -> Vec<Rule> {
        match input {
            RulesInput::Structured(rules) => rules.clone(),
            RulesInput::Encoded(text) => match decode_encoded_rules(text, self.config.accept_encoded_rules) {
                Ok(rules) => rules,
                Err(e) => {
                    log::warn!("response-code mapper: dropping encoded rules: {e}");
                    Vec::new()
                }
            },
        }
    }

    fn release_listener(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.unsubscribe();
        }
    }
}

/// Decode a rule list that arrived JSON-encoded in a string.
///
/// # Errors
///
/// Returns [`MapperError::EncodedRulesRejected`] when `accept` is false and
/// [`MapperError::RulesDecode`] for malformed JSON.
pub fn decode_encoded_rules(text: &str, accept: bool) -> Result<Vec<Rule>, MapperError> {
    if !accept {
        return Err(MapperError::EncodedRulesRejected);
    }
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(text)?)
}

/// Drain every event currently queued on `receiver` without waiting.
pub fn drain_events(receiver: &mut UnboundedReceiver<MapperEvent>) -> Vec<MapperEvent> {
    let mut out = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        out.push(event);
    }
    out
}

fn emit(events: &UnboundedSender<MapperEvent>, event: MapperEvent) {
    if events.unbounded_send(event).is_err() {
        log::debug!("response-code mapper: event receiver closed");
    }
}

fn form_spec(primary: FieldValue, rules: &[Rule]) -> FieldSpec {
    FieldSpec::group([
        (
            PRIMARY_CODE_FIELD,
            FieldSpec::validated(primary, [Validator::Required, Validator::Integer]),
        ),
        (RULES_FIELD, FieldSpec::List(rules.iter().map(rule_group_spec).collect())),
    ])
}

fn rule_group_spec(rule: &Rule) -> FieldSpec {
    FieldSpec::group([
        (STATUS_FIELD, FieldSpec::scalar(FieldValue::Text(rule.discriminant.clone()))),
        (ERRORS_FIELD, FieldSpec::scalar(rule.tags.clone().map_or(FieldValue::Unset, FieldValue::List))),
    ])
}

fn errors_path(index: usize) -> [Segment<'static>; 3] {
    [RULES_FIELD.into(), Segment::Index(index), ERRORS_FIELD.into()]
}

fn rule_groups(form: &Form) -> &[FormNode] {
    form.get(&[RULES_FIELD.into()])
        .and_then(FormNode::as_array)
        .unwrap_or_default()
}

fn rule_count(form: &Form) -> usize {
    rule_groups(form).len()
}

fn check_index(form: &Form, index: usize) -> Result<(), MapperError> {
    let len = rule_count(form);
    if index < len {
        Ok(())
    } else {
        Err(MapperError::RuleIndexOutOfRange { index, len })
    }
}

fn rules_from_form(form: &Form) -> Vec<Rule> {
    rule_groups(form)
        .iter()
        .map(|group| {
            let field = |key: &str| group.get(&[Segment::Key(key)]).and_then(FormNode::as_control).map(FormControl::value);
            Rule {
                discriminant: field(STATUS_FIELD).map(FieldValue::display).unwrap_or_default(),
                tags: field(ERRORS_FIELD).and_then(FieldValue::as_list).map(<[String]>::to_vec),
            }
        })
        .collect()
}
