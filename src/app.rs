//! Root application component hosting the step editor.

use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use mappings::{Configuration, FlowSteps, MapperConfig, RawConfiguration};

use crate::components::response_code_mapper::ResponseCodeMapper;

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root application component.
///
/// Provides the flow and mapper config contexts and keeps the host-side copy
/// of the step configuration the editor reports back.
///
/// The synchronizer only runs inside client effects, where there is no process
/// environment, so the editor always uses `MapperConfig::default()`. Hosts
/// embedding the component provide their own `MapperConfig` context to
/// override it.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    provide_context(MapperConfig::default());
    provide_context(RwSignal::new(FlowSteps::default()));

    let configuration = RwSignal::new(Some(RawConfiguration::from(Configuration::default())));
    let position = RwSignal::new(0_usize);
    let valid = RwSignal::new(false);

    let on_valid_change = Callback::new(move |next: bool| valid.set(next));
    let on_configuration_change = Callback::new(move |next: Configuration| {
        configuration.set(Some(RawConfiguration::from(next)));
    });

    view! {
        <Stylesheet id="leptos" href="/pkg/action-configure.css"/>
        <Title text="Configure response codes"/>

        <main class="step-editor" class:step-editor--invalid=move || !valid.get()>
            <ResponseCodeMapper
                configuration=configuration
                position=position
                on_valid_change=on_valid_change
                on_configuration_change=on_configuration_change
            />
        </main>
    }
}
