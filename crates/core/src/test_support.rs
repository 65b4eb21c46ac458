// SPDX-License-Identifier: MIT

//! Test builders and proptest strategies shared across the workspace's
//! test suites. Gated behind `test-support` so other crates can depend
//! on it only for `dev-dependencies`.

use crate::batch::UpdateBatch;
use crate::config::SessionConfig;

/// A `SessionConfig` rooted at four sibling directories under `root`,
/// none of which need to exist yet — callers create them as needed.
pub fn config_under(root: &std::path::Path) -> SessionConfig {
    SessionConfig::new(
        root.join("src"),
        root.join("work"),
        root.join("data"),
        root.join("tmp"),
    )
}

/// An `UpdateBatch` that puts a single trivially-valid module.
pub fn valid_module_batch(name: &str) -> UpdateBatch {
    UpdateBatch::empty().put_module(name, format!("module {name} where\nx = 1\n").into_bytes())
}

/// An `UpdateBatch` that puts a single module with a deliberate parse
/// error (an incomplete right-hand side), used to exercise scenario 3
/// of §8: a syntactic error is a diagnostic, not a failure.
pub fn broken_module_batch(name: &str) -> UpdateBatch {
    UpdateBatch::empty().put_module(name, format!("module {name} where\nx =\n").into_bytes())
}

#[cfg(feature = "test-support")]
pub mod strategies {
    use super::*;
    use proptest::prelude::*;

    /// Arbitrary small batches of "put a valid module" mutations, for
    /// property tests over `UpdateBatch::append`'s monoid laws.
    pub fn arb_batch() -> impl Strategy<Value = UpdateBatch> {
        proptest::collection::vec("[A-Z][a-zA-Z0-9]{0,5}", 0..6).prop_map(|names| {
            names.into_iter().fold(UpdateBatch::empty(), |batch, name| {
                batch.put_module(name, b"module X where\n".to_vec())
            })
        })
    }
}
