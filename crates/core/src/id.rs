// SPDX-License-Identifier: MIT

//! Debug-friendly, prefixed, serde-transparent IDs (SPEC_FULL §2's "IDs"
//! ambient-stack item). Session and request identities use this instead
//! of raw `u64`/`Uuid` so a log line or JSON dump names its own kind.

/// Define a newtype ID wrapper with a short type prefix and a random
/// nanoid suffix, e.g. `sess-V1StGXR8_Z5jdHi6B-myT`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(std::borrow::Cow<'static, str>);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new random ID with the type prefix.
            pub fn new() -> Self {
                Self(std::borrow::Cow::Owned(format!("{}{}", Self::PREFIX, nanoid::nanoid!(12))))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id! {
    /// Identifies one `IdeSession` value across its lifetime, independent
    /// of the process-wide [`crate::StateToken`] it carries at any given
    /// moment. Purely observational — no operation's correctness depends
    /// on it (SPEC_FULL §3's session restart counter is keyed off this).
    pub struct SessionId("sess-");
}

define_id! {
    /// Identifies one in-flight progress-RPC request (§4.6), for log
    /// correlation between the session side and worker side.
    pub struct RequestId("req-");
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
