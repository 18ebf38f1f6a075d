//! First-run detection from persisted flags.
//!
//! Answers, for one local installation of an application, whether this is
//! the first run, the first call of a check, or the first run since the
//! application was upgraded past a given build. State lives in a key-value
//! store under three fixed keys (see [`keys`]):
//!
//! | Key | Type | Default |
//! |---|---|---|
//! | `is_first_run` | bool | `true` |
//! | `is_first_call` | bool | `true` |
//! | `version` | build number, or `"0.0.0"` after a reset | `0` |
//!
//! Installations that predate a storage migration keep their old store as a
//! read-only fallback ([`Sources::with_legacy()`]); values found there are
//! copied into the primary store on first read.

mod build;
pub mod error;
pub mod keys;
mod open;
mod sources;
mod tracker;

pub use crate::build::{BuildHandle, BuildNumber, BuildProvider, FixedBuild, PackageBuild, parse_build_number};
pub use crate::open::{open, open_from_file};
pub use crate::sources::{Sources, decode_build, or_default};
pub use crate::tracker::FirstRunTracker;
