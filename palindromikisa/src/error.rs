//! Typed errors of the configuration store.
//!
//! Operations further up return `anyhow::Result`; a store failure embedded in
//! one can still be recovered with `e.downcast_ref::<StoreError>()`.

use std::path::PathBuf;

use thiserror::Error;

use crate::options::OptionSet;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The expected file exists but describes a different configuration
    #[error(
        "configuration conflict at {}: requested {expected_name} {expected}, found {found_name} {found}",
        path.display()
    )]
    Conflict {
        path: PathBuf,
        expected_name: String,
        expected: OptionSet,
        found_name: String,
        found: OptionSet,
    },

    #[error("malformed configuration record {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
