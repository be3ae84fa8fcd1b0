mod extra;
mod link;
mod package_name;
mod reqparse;
mod requirement;
mod sdist_name;
mod specifier;
mod version;
mod wheel_name;

// All this stuff is also re-exported from crate::prelude::*

pub use self::extra::Extra;
pub use self::link::{is_archive_file, is_url, Link};
pub use self::package_name::PackageName;
pub use self::reqparse::looks_like_location;
pub use self::requirement::{marker, ParseExtra, ParsedRequirement, Requirement};
pub use self::sdist_name::{SdistFormat, SdistName};
pub use self::specifier::{CompareOp, Specifier, Specifiers};
pub use self::version::{Version, VERSION_INFINITY, VERSION_ZERO};
pub use self::wheel_name::WheelName;
