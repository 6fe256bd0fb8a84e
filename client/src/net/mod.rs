//! Networking adapters for Firebase REST services.
//!
//! SYSTEM CONTEXT
//! ==============
//! `identity` implements the portal's identity provider over Firebase
//! Authentication; `firestore` implements its document store over
//! Firestore's `:runQuery` endpoint.

pub mod firestore;
pub mod identity;
