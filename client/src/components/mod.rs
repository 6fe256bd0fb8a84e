//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components render portal chrome (guard placeholder, badges, locale
//! switch) while reading shared state from Leptos context providers.

pub mod locale_toggle;
pub mod route_guard;
pub mod unread_badge;
