//! # client
//!
//! Leptos + WASM frontend for the merchant portal.
//!
//! This crate wires the runtime-agnostic `portal` core to the browser:
//! storage and cookie adapters, Firebase REST adapters for identity and
//! documents, reactive context providers, and the login and home pages.

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// WASM entry point: install logging and hydrate the server-rendered body.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    leptos::mount::hydrate_body(app::App);
}
