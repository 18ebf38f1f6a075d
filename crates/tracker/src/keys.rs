//! Stored keys and their defaults.

use crate::build::BuildNumber;

/// Whether [`is_first_run()`](crate::FirstRunTracker::is_first_run) has ever
/// resolved.
pub const IS_FIRST_RUN: &str = "is_first_run";
/// Whether [`is_first_call()`](crate::FirstRunTracker::is_first_call) has ever
/// been called.
pub const IS_FIRST_CALL: &str = "is_first_call";
/// Build number recorded by the last "since" query.
pub const VERSION: &str = "version";

/// What [`reset()`](crate::FirstRunTracker::reset) stores under [`VERSION`].
/// Decodes as build [`DEFAULT_BUILD`].
pub const RESET_VERSION: &str = "0.0.0";

/// Value of [`IS_FIRST_RUN`] and [`IS_FIRST_CALL`] when absent or unreadable.
pub const DEFAULT_FLAG: bool = true;
/// Value of [`VERSION`] when absent or unreadable.
pub const DEFAULT_BUILD: BuildNumber = 0;
