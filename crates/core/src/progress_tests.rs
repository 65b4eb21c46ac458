// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn starts_at_one() {
    let p = Progress::start("compiling M");
    assert_eq!(p.step, 1);
    assert_eq!(p.message, "compiling M");
}

#[test]
fn advance_increments_step_and_replaces_message() {
    let p = Progress::start("compiling M").advance("compiling N");
    assert_eq!(p.step, 2);
    assert_eq!(p.message, "compiling N");
}

#[test]
fn sequence_is_monotonically_non_decreasing() {
    let mut p = Progress::start("a");
    let mut steps = vec![p.step];
    for msg in ["b", "c", "d"] {
        p = p.advance(msg);
        steps.push(p.step);
    }
    assert!(steps.windows(2).all(|w| w[1] >= w[0]));
}
