use std::path::PathBuf;
use thiserror::Error;

/// Why a dependency specification couldn't be turned into a Dependency.
#[derive(Error, Debug)]
pub enum DependencyParseError {
    #[error("invalid dependency specification {input:?}: {reason}")]
    MalformedRequirement { input: String, reason: String },
    #[error("directory {} is not installable: no pyproject.toml, setup.py or setup.cfg found", path.display())]
    InvalidLocalPackage { path: PathBuf },
    #[error("invalid wheel name: {filename}")]
    InvalidWheelName { filename: String },
}

impl DependencyParseError {
    pub(crate) fn malformed(input: &str, reason: eyre::Report) -> DependencyParseError {
        DependencyParseError::MalformedRequirement {
            input: input.to_owned(),
            // {:#} renders the whole wrap_err chain on one line
            reason: format!("{:#}", reason),
        }
    }
}
