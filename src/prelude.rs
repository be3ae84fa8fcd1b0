pub use std::collections::HashMap;
pub use std::convert::{TryFrom, TryInto};
pub use std::fmt::Display;
pub use std::path::{Path, PathBuf};

pub use derivative::Derivative;
pub use eyre::{bail, eyre, Result, WrapErr};
pub use indexmap::IndexSet;
pub use once_cell::sync::Lazy;
pub use regex::Regex;
pub use serde::Serialize;
pub use serde_with::{DeserializeFromStr, SerializeDisplay};
pub use tracing::{debug, trace, warn};
pub use url::Url;

pub use crate::context;
pub use crate::try_from_str_boilerplate;
pub use crate::vocab::*;
