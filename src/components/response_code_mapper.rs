//! Response-code mapper step editor.
//!
//! ARCHITECTURE
//! ============
//! The component owns one `mappings::ResponseCodeMapper` in local storage.
//! Every DOM edit runs against the synchronizer, then the event channel is
//! drained and a fresh `MapperView` snapshot is published. Host callbacks run
//! after the synchronizer borrow ends, so a host that writes its inputs back
//! from a callback does not re-enter the synchronizer.

#[cfg(test)]
#[path = "response_code_mapper_test.rs"]
mod response_code_mapper_test;

use futures::channel::mpsc::UnboundedReceiver;
use leptos::logging::warn;
use leptos::prelude::*;
use mappings::mapper::drain_events;
use mappings::{Configuration, FlowSteps, InputChange, MapperConfig, MapperError, MapperEvent, RawConfiguration, StandardizedError};

use crate::state::mapper::{MapperView, RuleRow};
use crate::util::error_filter::filter_errors;

type Synchronizer = mappings::ResponseCodeMapper<FlowSteps>;
type BindingStore = StoredValue<Binding, LocalStorage>;

struct Binding {
    mapper: Synchronizer,
    events: UnboundedReceiver<MapperEvent>,
}

#[derive(Clone, Copy)]
struct Outputs {
    view: RwSignal<MapperView>,
    on_valid_change: Callback<bool>,
    on_configuration_change: Callback<Configuration>,
}

impl Outputs {
    fn publish(self, events: Vec<MapperEvent>, snapshot: MapperView) {
        self.view.set(snapshot);
        dispatch(
            events,
            |valid| self.on_valid_change.run(valid),
            |configuration| self.on_configuration_change.run(configuration),
        );
    }
}

/// Editor mapping error categories raised by upstream endpoints to HTTP
/// response codes.
///
/// Reads the flow from a `RwSignal<FlowSteps>` context and an optional
/// `MapperConfig` context.
#[component]
pub fn ResponseCodeMapper(
    #[prop(into)] configuration: Signal<Option<RawConfiguration>>,
    #[prop(into)] position: Signal<usize>,
    on_valid_change: Callback<bool>,
    on_configuration_change: Callback<Configuration>,
) -> impl IntoView {
    let flow = expect_context::<RwSignal<FlowSteps>>();
    let config = use_context::<MapperConfig>().unwrap_or_default();

    let (mapper, events) = Synchronizer::new(FlowSteps::default(), config);
    let binding: BindingStore = StoredValue::new_local(Binding { mapper, events });
    let outputs = Outputs {
        view: RwSignal::new(MapperView::default()),
        on_valid_change,
        on_configuration_change,
    };
    let query = RwSignal::new(String::new());

    // Configuration is only stored; a new position reloads. The flow is
    // re-read on every run so upstream edits reach the offered errors.
    Effect::new(move || {
        let steps = flow.get();
        let changes = [
            InputChange::Configuration(configuration.get()),
            InputChange::Position(position.get()),
        ];
        let settled = binding.try_update_value(|b| sync_inputs(b, steps, changes));
        if let Some((events, snapshot)) = settled {
            outputs.publish(events, snapshot);
        }
    });

    on_cleanup(move || {
        binding.update_value(|b| b.mapper.dispose());
    });

    view! {
        <div class="response-code-mapper">
            <Show
                when=move || !outputs.view.with(MapperView::loading)
                fallback=|| view! { <div class="response-code-mapper__loading">"Loading..."</div> }
            >
                <label class="response-code-mapper__primary">
                    <span class="response-code-mapper__label">"Response code"</span>
                    <input
                        class="response-code-mapper__input"
                        type="text"
                        inputmode="numeric"
                        prop:value=move || outputs.view.with(|v| v.primary_code.clone())
                        on:change=move |ev| {
                            let raw = event_target_value(&ev);
                            apply(binding, outputs, move |m| m.set_primary_code(&raw));
                        }
                    />
                </label>
                <input
                    class="response-code-mapper__search"
                    type="search"
                    placeholder="Filter errors"
                    prop:value=move || query.get()
                    on:input=move |ev| query.set(event_target_value(&ev))
                />
                <div class="response-code-mapper__rules">
                    {move || {
                        let view = outputs.view.get();
                        if view.rules.is_empty() {
                            return view! {
                                <span class="response-code-mapper__empty">"No error codes mapped"</span>
                            }
                            .into_any();
                        }
                        let offered = filter_errors(&view.known_errors, &query.get());
                        view.rules
                            .into_iter()
                            .map(|row| rule_row(binding, outputs, row, &offered))
                            .collect_view()
                            .into_any()
                    }}
                </div>
                <span
                    class="response-code-mapper__validity"
                    class:response-code-mapper__validity--invalid=move || !outputs.view.with(|v| v.valid)
                >
                    {move || if outputs.view.with(|v| v.valid) { "Valid" } else { "Invalid" }}
                </span>
            </Show>
        </div>
    }
}

fn rule_row(binding: BindingStore, outputs: Outputs, row: RuleRow, offered: &[StandardizedError]) -> impl IntoView {
    let index = row.index;
    let chips = row
        .chips(offered)
        .into_iter()
        .map(|chip| {
            let label = chip.error.label().to_owned();
            let title = chip.error.name.clone();
            let error = chip.error;
            view! {
                <button
                    type="button"
                    class="response-code-mapper__chip"
                    class:response-code-mapper__chip--assigned=chip.assigned
                    title=title
                    on:click=move |_| {
                        let error = error.clone();
                        apply(binding, outputs, move |m| m.toggle_tag_assignment(&error, index));
                    }
                >
                    {label}
                </button>
            }
        })
        .collect_view();

    view! {
        <div class="response-code-mapper__rule">
            <input
                class="response-code-mapper__status"
                type="text"
                inputmode="numeric"
                prop:value=row.status
                on:change=move |ev| {
                    let raw = event_target_value(&ev);
                    apply(binding, outputs, move |m| m.set_discriminant(index, &raw));
                }
            />
            <div class="response-code-mapper__chips">{chips}</div>
        </div>
    }
}

/// Run one edit, commit it, and publish the outcome.
fn apply<F>(binding: BindingStore, outputs: Outputs, edit: F)
where
    F: FnOnce(&mut Synchronizer) -> Result<(), MapperError>,
{
    let settled = binding.try_update_value(|b| commit(b, edit));
    if let Some((events, snapshot)) = settled {
        outputs.publish(events, snapshot);
    }
}

/// Forward host inputs and the current flow, then re-read the flow.
fn sync_inputs(
    binding: &mut Binding,
    steps: FlowSteps,
    changes: impl IntoIterator<Item = InputChange>,
) -> (Vec<MapperEvent>, MapperView) {
    binding.mapper.set_context(steps);
    binding.mapper.on_external_input_changed(changes);
    binding.mapper.initialize();
    settle(binding)
}

/// Apply `edit` and, when accepted, commit the form. Returns the drained
/// events and the resulting snapshot.
fn commit<F>(binding: &mut Binding, edit: F) -> (Vec<MapperEvent>, MapperView)
where
    F: FnOnce(&mut Synchronizer) -> Result<(), MapperError>,
{
    match edit(&mut binding.mapper) {
        Ok(()) => binding.mapper.on_form_changed(),
        Err(e) => warn!("response-code mapper: edit rejected: {e}"),
    }
    settle(binding)
}

/// Route events to the host callbacks in emission order.
fn dispatch(events: Vec<MapperEvent>, mut on_valid: impl FnMut(bool), mut on_configuration: impl FnMut(Configuration)) {
    for event in events {
        match event {
            MapperEvent::ValidityChanged(valid) => on_valid(valid),
            MapperEvent::ConfigurationChanged(configuration) => on_configuration(configuration),
        }
    }
}

fn settle(binding: &mut Binding) -> (Vec<MapperEvent>, MapperView) {
    (drain_events(&mut binding.events), MapperView::capture(&binding.mapper))
}
