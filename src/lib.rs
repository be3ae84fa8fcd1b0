pub mod dependency;
pub mod error;
pub mod fs;
pub mod output;
mod prelude;
mod util;
pub mod vocab;

#[cfg(test)]
mod test_util;

pub use crate::dependency::{dependency_from_spec, Dependency, DependencyParser};
pub use crate::error::DependencyParseError;
