//! # action-configure
//!
//! Leptos + WASM step-configuration widgets for the integration editor.
//!
//! This crate contains the response-code mapper component, its render state,
//! and small list helpers. Form state, validation, and synchronization with
//! the host's configuration live in the UI-agnostic `mappings` crate; this
//! crate only binds them to the DOM.

pub mod app;
pub mod components;
pub mod state;
pub mod util;

/// WASM entry point: hydrate the server-rendered shell.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        leptos::logging::warn!("console logger already installed: {e}");
    }
    leptos::mount::hydrate_body(app::App);
}
