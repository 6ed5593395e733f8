use std::io;

use thiserror::Error;
use ui_probe::ProbeError;

#[derive(Debug, Error)]
pub(crate) enum DemoError {
    #[error("read {what} '{path}': {source}")]
    Read {
        what: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("parse {what} json{}: {message}", path_suffix(.path))]
    Parse {
        what: &'static str,
        path: Option<String>,
        message: String,
    },
    #[error("validation failed at {path}: {message}")]
    Validation { path: String, message: String },
    #[error("error: {reason}. usage: {usage}")]
    Command { reason: String, usage: String },
    #[error("write report: {0}")]
    Report(#[from] io::Error),
    #[error("encode report: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

fn path_suffix(path: &Option<String>) -> String {
    match path {
        Some(path) => format!(" at {path}"),
        None => String::new(),
    }
}
