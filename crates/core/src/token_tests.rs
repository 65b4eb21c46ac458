// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn fresh_cell_starts_at_zero() {
    let cell = TokenCell::new();
    assert_eq!(cell.current().value(), 0);
    assert!(cell.check(StateToken::INITIAL).is_ok());
}

#[test]
fn advance_is_monotonic_and_visible_to_clones() {
    let cell = TokenCell::new();
    let clone = cell.clone();

    let t1 = cell.advance();
    let t2 = cell.advance();
    assert!(t2 > t1);
    assert_eq!(clone.current(), t2);
}

#[test]
fn check_fails_on_stale_token() {
    let cell = TokenCell::new();
    let stale = cell.current();
    cell.advance();

    let err = cell.check(stale).unwrap_err();
    assert!(err.is_stale());
}

#[test]
fn check_succeeds_after_resync() {
    let cell = TokenCell::new();
    let current = cell.advance();
    assert!(cell.check(current).is_ok());
}
