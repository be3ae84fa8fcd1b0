/// Work around an annoyance in Rust's standard traits -- if you define
/// TryFrom<&str>, then you probably also want TryFrom<String> and FromStr,
/// and the implementation is trivial in terms of TryFrom<&str>. So this macro
/// just generates the boilerplate for you.
#[macro_export]
macro_rules! try_from_str_boilerplate {
    ($name:ident) => {
        impl std::convert::TryFrom<String> for $name {
            type Error = eyre::Report;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                (&*s).try_into()
            }
        }

        impl std::str::FromStr for $name {
            type Err = eyre::Report;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.try_into()
            }
        }
    };
}

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path, dropping `.` and resolving `..` against the
/// components seen so far. Doesn't touch the filesystem, so symlinks are not
/// followed (same as Python's os.path.normpath).
pub fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    let mut components = path.as_ref().components().peekable();
    let mut ret = if let Some(c @ Component::Prefix(..)) = components.peek().copied() {
        components.next();
        PathBuf::from(c.as_os_str())
    } else {
        PathBuf::new()
    };

    for component in components {
        match component {
            Component::Prefix(..) => unreachable!(),
            Component::RootDir => ret.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                ret.pop();
            }
            Component::Normal(c) => ret.push(c),
        }
    }
    ret
}

/// `base.join(path)`, normalized. Absolute `path`s ignore `base`.
pub fn absolutize(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    normalize_path(base.join(path))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a/b/../c/./d"), PathBuf::from("/a/c/d"));
        assert_eq!(normalize_path("/a/../../b"), PathBuf::from("/b"));
        assert_eq!(
            absolutize(Path::new("/work/proj"), "../other/pkg"),
            PathBuf::from("/work/other/pkg")
        );
        assert_eq!(
            absolutize(Path::new("/work/proj"), "/abs/pkg"),
            PathBuf::from("/abs/pkg")
        );
    }
}
