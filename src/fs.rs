use crate::prelude::*;
use auto_impl::auto_impl;

/// Files that mark a directory as something a build frontend can turn into a
/// distribution.
pub const BUILD_DESCRIPTORS: &[&str] = &["pyproject.toml", "setup.py", "setup.cfg"];

/// The read-only questions source classification asks about the filesystem.
#[auto_impl(&, Box, Arc)]
pub trait Filesystem {
    fn is_directory(&self, path: &Path) -> bool;

    /// Whether `path` is named like an installable archive. Looks at the name
    /// only, the file doesn't have to exist.
    fn is_file_archive(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map_or(false, is_archive_file)
    }

    /// Absolute, lexically normalized version of `path`, with relative paths
    /// taken relative to `base`.
    fn normalize(&self, base: &Path, path: &Path) -> PathBuf {
        crate::util::absolutize(base, path)
    }

    fn has_build_descriptor(&self, dir: &Path) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn has_build_descriptor(&self, dir: &Path) -> bool {
        BUILD_DESCRIPTORS
            .iter()
            .any(|descriptor| dir.join(descriptor).is_file())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_local_filesystem() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = LocalFilesystem;

        let project = tmp.path().join("project");
        std::fs::create_dir(&project).unwrap();
        assert!(fs.is_directory(&project));
        assert!(!fs.has_build_descriptor(&project));

        std::fs::write(project.join("setup.cfg"), "[metadata]\n").unwrap();
        assert!(fs.has_build_descriptor(&project));

        // a directory named like a descriptor doesn't count
        let other = tmp.path().join("other");
        std::fs::create_dir_all(other.join("pyproject.toml")).unwrap();
        assert!(!fs.has_build_descriptor(&other));

        assert!(fs.is_file_archive(Path::new("/nowhere/foo-1.0.tar.gz")));
        assert!(!fs.is_file_archive(&project));
        assert!(!fs.is_directory(&tmp.path().join("missing")));

        assert_eq!(
            fs.normalize(Path::new("/base/dir"), Path::new("./a/../b")),
            PathBuf::from("/base/dir/b")
        );
    }
}
