// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn stale_session_is_stale() {
    let err = SessionError::StaleSession { given: 1, current: 2 };
    assert!(err.is_stale());
    assert!(!err.is_not_computed());
}

#[test]
fn no_computed_yet_message() {
    let err = SessionError::NoComputedYet;
    assert!(err.is_not_computed());
    assert_eq!(err.to_string(), "no computed result yet (before first compile, or since the last mutation)");
}

#[test]
fn cancelled_is_cancelled_and_not_stale() {
    let err = SessionError::Cancelled;
    assert!(err.is_cancelled());
    assert!(!err.is_stale());
}
