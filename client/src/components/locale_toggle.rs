//! Button that flips the UI between Arabic and English.

use leptos::prelude::*;

use crate::state::locale::{LocaleSignal, tr};
use crate::state::services::PortalServices;

#[component]
pub fn LocaleToggle() -> impl IntoView {
    let locale = expect_context::<LocaleSignal>();
    let context = expect_context::<PortalServices>().locale;
    let label = tr(locale, "locale.switch");

    let on_click = move |_| {
        let _ = context.toggle_locale();
    };

    view! {
        <button class="locale-toggle" type="button" on:click=on_click>
            {label}
        </button>
    }
}
