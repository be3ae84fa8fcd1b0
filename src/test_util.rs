use crate::prelude::*;

/// Create `base/rel` (and parents), optionally dropping an empty build
/// descriptor file into it. Returns the directory.
pub fn project_dir(base: &Path, rel: &str, descriptor: Option<&str>) -> PathBuf {
    let dir = base.join(rel);
    std::fs::create_dir_all(&dir).unwrap();
    if let Some(descriptor) = descriptor {
        std::fs::write(dir.join(descriptor), "").unwrap();
    }
    dir
}
