//! Unread-count badge.

#[cfg(test)]
#[path = "unread_badge_test.rs"]
mod unread_badge_test;

use leptos::prelude::*;
use portal::unread::UnreadAggregate;

/// Counts above this render as `99+`.
pub const BADGE_MAX: u64 = 99;

/// Badge label, or `None` when there is nothing unread.
pub fn badge_text(aggregate: &UnreadAggregate) -> Option<String> {
    match aggregate.count {
        0 => None,
        n if n > BADGE_MAX => Some(format!("{BADGE_MAX}+")),
        n => Some(n.to_string()),
    }
}

/// Count bubble next to a navigation entry. Hidden at zero; a query error
/// keeps the last count and marks the badge stale.
#[component]
pub fn UnreadBadge(#[prop(into)] state: Signal<UnreadAggregate>) -> impl IntoView {
    let text = move || badge_text(&state.get());
    let class = move || {
        if state.get().error.is_some() { "unread-badge unread-badge--stale" } else { "unread-badge" }
    };
    let title = move || state.get().error.unwrap_or_default();

    view! {
        <Show when=move || text().is_some()>
            <span class=class title=title>
                {move || text().unwrap_or_default()}
            </span>
        </Show>
    }
}
