//! Build metadata embedded by `build.rs`, shown by `--version` and logged at
//! server startup.

/// Short git commit hash, or `unknown` outside a checkout.
pub const GIT_HASH: &str = env!("UDPQ_GIT_HASH");

/// Build time as seconds since the Unix epoch.
pub const BUILD_TIMESTAMP: &str = env!("UDPQ_BUILD_TIMESTAMP");

/// Cargo profile (`debug` or `release`).
pub const BUILD_PROFILE: &str = env!("UDPQ_BUILD_PROFILE");

/// Crate version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version line used by both binaries, e.g. `"0.1.0 (abc1234, debug)"`.
pub const VERSION_LINE: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("UDPQ_GIT_HASH"),
    ", ",
    env!("UDPQ_BUILD_PROFILE"),
    ")"
);

/// [`VERSION_LINE`] as an owned string.
pub fn version_string() -> String {
    VERSION_LINE.to_string()
}
