use crate::error::DependencyParseError;
use crate::fs::Filesystem;
use crate::prelude::*;

/// Where a specification says the distribution comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceClassification {
    /// An ordinary name from a package index.
    PlainName,
    LocalDirectory(PathBuf),
    LocalArchive(PathBuf),
    RemoteUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub source: SourceClassification,
    /// Extras written as a suffix on a local path, e.g. `./pkg[socks]`.
    pub path_extras: Vec<Extra>,
}

/// Split `some/path[extra1,extra2]` into the path and its extras.
pub fn strip_extras(candidate: &str) -> Result<(&str, Vec<Extra>)> {
    static EXTRAS_SUFFIX: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(.+)\[([^\]]*)\]$").unwrap());

    match EXTRAS_SUFFIX.captures(candidate) {
        Some(captures) => {
            let (Some(path), Some(extras)) = (captures.get(1), captures.get(2)) else {
                return Ok((candidate, Vec::new()));
            };
            let extras = extras
                .as_str()
                .split(',')
                .map(str::trim)
                .filter(|extra| !extra.is_empty())
                .map(Extra::try_from)
                .collect::<Result<Vec<_>>>()?;
            Ok((path.as_str(), extras))
        }
        None => Ok((candidate, Vec::new())),
    }
}

fn has_path_separator(candidate: &str) -> bool {
    candidate.contains('/') || candidate.contains(std::path::MAIN_SEPARATOR)
}

/// Decide what kind of thing the requirement points at. Paths are resolved
/// against `base`.
pub fn classify(
    parsed: &ParsedRequirement,
    base: &Path,
    fs: &dyn Filesystem,
) -> Result<Classified, DependencyParseError> {
    let head = parsed.head();
    let plain = |source| Classified {
        source,
        path_extras: Vec::new(),
    };

    if is_url(head) {
        return Ok(plain(SourceClassification::RemoteUrl(head.to_owned())));
    }
    if let ParsedRequirement::Named(Requirement { url: Some(url), .. }) = parsed {
        return Ok(plain(SourceClassification::RemoteUrl(url.clone())));
    }

    let (candidate, path_extras) =
        strip_extras(head).map_err(|e| DependencyParseError::malformed(head, e))?;
    let path = fs.normalize(base, Path::new(candidate));

    // A bare name that happens to match a directory is still a name.
    if fs.is_directory(&path) && (has_path_separator(head) || head.starts_with('.')) {
        if !fs.has_build_descriptor(&path) {
            return Err(DependencyParseError::InvalidLocalPackage { path });
        }
        debug!("{:?} is a local directory at {}", head, path.display());
        return Ok(Classified {
            source: SourceClassification::LocalDirectory(path),
            path_extras,
        });
    }
    if fs.is_file_archive(&path) {
        debug!("{:?} is a local archive at {}", head, path.display());
        return Ok(Classified {
            source: SourceClassification::LocalArchive(path),
            path_extras,
        });
    }

    match parsed {
        ParsedRequirement::Named(_) => Ok(plain(SourceClassification::PlainName)),
        ParsedRequirement::Location { location, .. } => {
            Err(DependencyParseError::MalformedRequirement {
                input: location.clone(),
                reason: format!(
                    "{} is neither an installable directory nor an archive",
                    path.display()
                ),
            })
        }
    }
}
