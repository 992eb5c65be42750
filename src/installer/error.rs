use std::io;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program} {action}` exited with {status}")]
    Failed {
        program: String,
        action: &'static str,
        status: ExitStatus,
    },

    #[error("failed to forward installer output: {0}")]
    Io(#[from] io::Error),
}
