// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn session_ids_carry_their_prefix_and_are_unique() {
    let a = SessionId::new();
    let b = SessionId::new();
    assert!(a.as_str().starts_with(SessionId::PREFIX));
    assert_ne!(a, b);
}

#[test]
fn request_ids_display_as_their_string_form() {
    let id = RequestId::new();
    assert_eq!(format!("{id}"), id.as_str());
}

#[test]
fn ids_round_trip_through_json() {
    let id = SessionId::new();
    let json = serde_json::to_string(&id).unwrap();
    let back: SessionId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
}
