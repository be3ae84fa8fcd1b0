use crate::prelude::*;

// Archive extensions pip recognizes as something it could install from.
const ARCHIVE_EXTENSIONS: &[&str] = &[
    ".zip", ".whl", ".tar.bz2", ".tbz", ".tar.xz", ".txz", ".tlz", ".tar.lz",
    ".tar.lzma", ".tar.gz", ".tgz", ".tar",
];

const VCS_SCHEMES: &[&str] = &["git", "hg", "svn", "bzr"];

/// True if `name` ends in one of the archive extensions (case-insensitively).
/// Only looks at the name, never at the file.
pub fn is_archive_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ARCHIVE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Does this look like a URL, as opposed to a name or a filesystem path?
///
/// Anything of the form `scheme://...` counts, and so do the schemes that are
/// allowed to skip the `//` (`file:`, and the `vcs+transport:` family).
pub fn is_url(s: &str) -> bool {
    static SCHEME: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.-]*):(//)?").unwrap());

    let Some(captures) = SCHEME.captures(s) else {
        return false;
    };
    if captures.get(2).is_some() {
        return true;
    }
    let scheme = captures[1].to_ascii_lowercase();
    if scheme == "file" {
        return true;
    }
    match scheme.split_once('+') {
        Some((vcs, _)) => VCS_SCHEMES.contains(&vcs),
        None => false,
    }
}

/// A resolved location for a distribution: a remote URL, a VCS URL, or a
/// `file:` URL pointing at a local directory or archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    url: Url,
}

impl Link {
    pub fn parse(s: &str) -> Result<Link> {
        let url = Url::parse(s).wrap_err_with(|| format!("invalid URL {:?}", s))?;
        Ok(Link { url })
    }

    pub fn from_path(path: &Path) -> Result<Link> {
        let url = Url::from_file_path(path)
            .map_err(|()| eyre!("can't make a file: URL from {:?}", path))?;
        Ok(Link { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// The last non-empty path segment, e.g. "foo-1.0-py3-none-any.whl".
    pub fn filename(&self) -> &str {
        self.url
            .path()
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("")
    }

    pub fn is_wheel(&self) -> bool {
        self.filename().ends_with(".whl")
    }

    /// The `egg=` entry of the fragment, as in
    /// `git+https://example.com/repo.git#egg=name&subdirectory=sub`.
    pub fn egg_fragment(&self) -> Option<&str> {
        self.url
            .fragment()?
            .split('&')
            .find_map(|piece| piece.strip_prefix("egg="))
            .filter(|egg| !egg.is_empty())
    }

    pub fn url_without_fragment(&self) -> Url {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url
    }

    /// For `file:` links, the local path.
    pub fn file_path(&self) -> Option<PathBuf> {
        if self.scheme() != "file" {
            return None;
        }
        self.url.to_file_path().ok()
    }

    /// Split a `git+<transport>://...` link into the URL git understands and
    /// the revision pinned after the last `@` of the path, if any:
    ///
    ///   git+https://example.com/repo.git@v1.0#egg=foo
    ///     -> (https://example.com/repo.git, Some("v1.0"))
    pub fn git_locator(&self) -> Result<(Url, Option<String>)> {
        let stripped = self
            .url
            .as_str()
            .strip_prefix("git+")
            .ok_or_else(|| eyre!("missing git+ prefix for git URL {}", self.url))?;
        let mut url = Url::parse(stripped)
            .wrap_err_with(|| format!("invalid git URL {:?}", stripped))?;
        url.set_fragment(None);

        let path = url.path().to_owned();
        let rev = match path.rsplit_once('@') {
            Some((repo, rev)) if !rev.is_empty() => {
                url.set_path(repo);
                Some(rev.to_owned())
            }
            _ => None,
        };
        Ok((url, rev))
    }
}

impl Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/foo.zip"));
        assert!(is_url("git+https://example.com/repo.git"));
        assert!(is_url("git+ssh://git@example.com/repo.git"));
        assert!(is_url("git://example.com/repo.git"));
        assert!(is_url("file:../foo"));
        assert!(is_url("hg+http:example.com/repo"));
        assert!(is_url("s3://bucket/foo.whl"));
        assert!(!is_url("foo"));
        assert!(!is_url("./foo/bar"));
        assert!(!is_url("C:\\projects\\foo"));
        assert!(!is_url("mailto:someone"));
    }

    #[test]
    fn test_is_archive_file() {
        for name in ["foo-1.0.tar.gz", "foo.ZIP", "foo-1.0-py3-none-any.whl", "x.tgz", "x.tar"] {
            assert!(is_archive_file(name), "{}", name);
        }
        for name in ["foo", "foo.py", "foo-1.0.gz", "pyproject.toml"] {
            assert!(!is_archive_file(name), "{}", name);
        }
    }

    #[test]
    fn test_link_pieces() {
        let link =
            Link::parse("https://example.com/dist/foo-1.0-py3-none-any.whl#sha256=abc").unwrap();
        assert_eq!(link.scheme(), "https");
        assert_eq!(link.filename(), "foo-1.0-py3-none-any.whl");
        assert!(link.is_wheel());
        assert_eq!(link.egg_fragment(), None);
        assert_eq!(
            link.url_without_fragment().as_str(),
            "https://example.com/dist/foo-1.0-py3-none-any.whl"
        );

        let link = Link::parse("https://example.com/archive/main.zip#egg=foo&subdirectory=x")
            .unwrap();
        assert_eq!(link.egg_fragment(), Some("foo"));
        assert!(!link.is_wheel());

        let link = Link::from_path(Path::new("/tmp/some dir/pkg/")).unwrap();
        assert_eq!(link.scheme(), "file");
        assert_eq!(link.filename(), "pkg");
        assert_eq!(link.file_path(), Some(PathBuf::from("/tmp/some dir/pkg")));
    }

    #[test]
    fn test_git_locator() {
        let link = Link::parse("git+https://github.com/demo/demo.git@v1.0#egg=demo").unwrap();
        assert_eq!(link.scheme(), "git+https");
        let (url, rev) = link.git_locator().unwrap();
        assert_eq!(url.as_str(), "https://github.com/demo/demo.git");
        assert_eq!(rev.as_deref(), Some("v1.0"));

        // branch names can have slashes in them
        let link =
            Link::parse("git+https://github.com/org/repo.git@feature/x#egg=pkg").unwrap();
        let (url, rev) = link.git_locator().unwrap();
        assert_eq!(url.as_str(), "https://github.com/org/repo.git");
        assert_eq!(rev.as_deref(), Some("feature/x"));

        let link = Link::parse("git+ssh://git@example.com/corp/utils.git").unwrap();
        let (url, rev) = link.git_locator().unwrap();
        assert_eq!(url.as_str(), "ssh://git@example.com/corp/utils.git");
        assert_eq!(rev, None);

        let link = Link::parse("https://example.com/repo.git").unwrap();
        assert!(link.git_locator().is_err());
    }
}
