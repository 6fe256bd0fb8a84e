//! Reactive state shared through Leptos context.
//!
//! SYSTEM CONTEXT
//! ==============
//! `App` mirrors every core publisher into an `RwSignal` and provides it,
//! together with the service handles in `services`, to the whole tree.

pub mod auth;
pub mod locale;
pub mod services;
pub mod unread;
