//! The crate's error type.
//!
//! Only two kinds of failure are fatal: a bad command line, and an I/O
//! failure opening or transferring a block. Everything else
//! (geometry/metadata violations) is a [`crate::diagnostic::Diagnostic`],
//! never an `Err`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("{path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
