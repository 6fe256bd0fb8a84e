//! Unread-count signals for the chat and notification badges.
//!
//! Two newtypes so both aggregates can be provided through context without
//! colliding on the `RwSignal<UnreadAggregate>` type.

use leptos::prelude::RwSignal;
use portal::unread::UnreadAggregate;

#[derive(Clone, Copy, Debug)]
pub struct ChatUnreadCount(pub RwSignal<UnreadAggregate>);

#[derive(Clone, Copy, Debug)]
pub struct NotificationUnreadCount(pub RwSignal<UnreadAggregate>);
