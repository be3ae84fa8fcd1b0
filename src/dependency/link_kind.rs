use crate::error::DependencyParseError;
use crate::prelude::*;

/// What a link actually points at, once we've looked at its scheme and
/// filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKind {
    Wheel { name: PackageName, version: Version },
    Vcs {
        vcs: String,
        url: Url,
        rev: Option<String>,
    },
    DirectUrl { url: Url },
    /// Something we can't represent (a local file, an hg repo, ...). The
    /// dependency degrades to a bare name.
    Opaque,
}

/// Turn a URL string into a Link. Relative `file:` URLs (`file:../pkg`) are
/// taken relative to `base`, since URL parsing alone would resolve them
/// against the filesystem root.
pub fn link_from_url(raw: &str, base: &Path) -> Result<Link> {
    if let Some(rest) = raw.strip_prefix("file:") {
        if rest.contains("../") {
            let (path, fragment) = match rest.split_once('#') {
                Some((path, fragment)) => (path, Some(fragment)),
                None => (rest, None),
            };
            let path = crate::util::absolutize(base, Path::new(path.trim_start_matches("//")));
            let link = Link::from_path(&path)?;
            trace!("resolved relative file link {:?} to {}", raw, link);
            return match fragment {
                Some(fragment) => Link::parse(&format!("{}#{}", link, fragment)),
                None => Ok(link),
            };
        }
    }
    Link::parse(raw)
}

/// Sort a link into one of the kinds of source we can describe.
pub fn disambiguate(link: &Link) -> Result<LinkKind, DependencyParseError> {
    if link.is_wheel() {
        let filename = link.filename();
        let wheel = WheelName::try_from(filename).map_err(|e| {
            debug!("rejecting wheel {:?}: {:#}", filename, e);
            DependencyParseError::InvalidWheelName {
                filename: filename.to_owned(),
            }
        })?;
        return Ok(LinkKind::Wheel {
            name: wheel.distribution,
            version: wheel.version,
        });
    }

    let scheme = link.scheme();
    if scheme.starts_with("git+") {
        let (url, rev) = link
            .git_locator()
            .map_err(|e| DependencyParseError::malformed(link.url().as_str(), e))?;
        Ok(LinkKind::Vcs {
            vcs: "git".into(),
            url,
            rev,
        })
    } else if scheme == "git" {
        Ok(LinkKind::Vcs {
            vcs: "git".into(),
            url: link.url_without_fragment(),
            rev: None,
        })
    } else if scheme == "http" || scheme == "https" {
        Ok(LinkKind::DirectUrl {
            url: link.url_without_fragment(),
        })
    } else {
        warn!(
            "don't know how to install from {} links; treating {} as a plain name",
            scheme, link
        );
        Ok(LinkKind::Opaque)
    }
}

/// Work out the package name for a link that isn't a wheel: the name the user
/// wrote (`name @ url`), then `#egg=`, then an sdist filename, then the
/// directory name of a local path.
pub fn derive_name(
    declared: Option<&PackageName>,
    link: &Link,
) -> Result<PackageName, DependencyParseError> {
    if let Some(name) = declared {
        return Ok(name.clone());
    }
    if let Some(egg) = link.egg_fragment() {
        return PackageName::try_from(egg)
            .map_err(|e| DependencyParseError::malformed(link.url().as_str(), e));
    }
    if let Ok(sdist) = SdistName::try_from(link.filename()) {
        return Ok(sdist.distribution);
    }
    if let Some(path) = link.file_path() {
        if !crate::vocab::is_archive_file(link.filename()) {
            if let Some(dir_name) = path.file_name().and_then(|n| n.to_str()) {
                if let Ok(name) = PackageName::try_from(dir_name) {
                    return Ok(name);
                }
            }
        }
    }
    Err(DependencyParseError::MalformedRequirement {
        input: link.to_string(),
        reason: "can't work out a package name; add #egg=<name> or use 'name @ url'"
            .into(),
    })
}
