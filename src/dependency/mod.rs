mod classify;
mod link_kind;
mod markers;
mod splitter;

use crate::error::DependencyParseError;
use crate::fs::{Filesystem, LocalFilesystem};
use crate::prelude::*;

pub use self::classify::{classify, strip_extras, Classified, SourceClassification};
pub use self::link_kind::{derive_name, disambiguate, link_from_url, LinkKind};
pub use self::markers::{group_markers, translate, GroupedMarkers, MarkerEffects};
pub use self::splitter::split_spec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Active,
    /// Only installed when one of `in_extras` is requested.
    Optional,
}

/// Where the dependency gets installed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Source {
    /// Whatever the package index has that satisfies the constraint.
    Plain,
    Vcs {
        vcs: String,
        url: Url,
        rev: Option<String>,
    },
    Url { url: Url },
}

#[derive(Debug, Clone, Serialize)]
pub struct Dependency {
    name: PackageName,
    source: Source,
    constraint: String,
    extras: IndexSet<Extra>,
    in_extras: Vec<String>,
    python_versions: String,
    marker: Option<marker::Expr>,
    activation: Activation,
}

impl Dependency {
    pub fn name(&self) -> &PackageName {
        &self.name
    }

    /// The PEP 503 normalized name, for comparing against other dependencies.
    pub fn base_name(&self) -> &str {
        self.name.normalized()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Version constraint text: "*" for anything, a bare version for a pin
    /// taken from a wheel filename, otherwise a specifier list like
    /// ">=1.0,<2".
    pub fn constraint(&self) -> &str {
        &self.constraint
    }

    pub fn extras(&self) -> &IndexSet<Extra> {
        &self.extras
    }

    pub fn in_extras(&self) -> &[String] {
        &self.in_extras
    }

    pub fn python_versions(&self) -> &str {
        &self.python_versions
    }

    pub fn marker(&self) -> Option<&marker::Expr> {
        self.marker.as_ref()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn is_optional(&self) -> bool {
        self.activation == Activation::Optional
    }

    pub fn deactivate(&mut self) {
        if self.activation == Activation::Active {
            trace!("{} is now optional", self.name.as_given());
            self.activation = Activation::Optional;
        }
    }

    pub fn specifiers(&self) -> Result<Specifiers> {
        if self.constraint == "*" {
            return Ok(Specifiers::any());
        }
        if let Ok(version) = Version::try_from(self.constraint.as_str()) {
            return Ok(Specifiers(vec![Specifier {
                op: CompareOp::Equal,
                value: version.to_string(),
            }]));
        }
        Specifiers::try_from(self.constraint.as_str())
    }

    /// Evaluate the original marker in a concrete environment. No marker
    /// always matches.
    pub fn marker_matches(&self, env: &dyn marker::Env) -> Result<bool> {
        match &self.marker {
            Some(m) => m.eval(env),
            None => Ok(true),
        }
    }

    /// Render back to a requirement string. Local paths and other links we
    /// can't describe come out as a bare name.
    pub fn to_pep_508(&self) -> String {
        let mut out = self.name.as_given().to_owned();
        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(|e| e.as_given()).collect();
            out.push('[');
            out.push_str(&extras.join(","));
            out.push(']');
        }

        let direct = match &self.source {
            Source::Plain => None,
            Source::Vcs { vcs, url, rev } => Some(match rev {
                Some(rev) => format!("{}+{}@{}", vcs, url, rev),
                None => format!("{}+{}", vcs, url),
            }),
            Source::Url { url } => Some(url.to_string()),
        };
        match direct {
            Some(direct) => {
                out.push_str(" @ ");
                out.push_str(&direct);
                if let Some(m) = &self.marker {
                    out.push_str(&format!(" ; {}", m));
                }
            }
            None => {
                match self.specifiers() {
                    Ok(specifiers) => out.push_str(&specifiers.to_string()),
                    Err(_) => out.push_str(&self.constraint),
                }
                if let Some(m) = &self.marker {
                    out.push_str(&format!("; {}", m));
                }
            }
        }
        out
    }
}

impl Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_pep_508())
    }
}

// Constraints are compared by meaning, so a wheel pin "1.0" equals "==1.0".
impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.source == other.source
            && self.specifiers().ok() == other.specifiers().ok()
            && self.extras == other.extras
            && self.in_extras == other.in_extras
            && self.python_versions == other.python_versions
            && self.marker == other.marker
            && self.activation == other.activation
    }
}

impl Eq for Dependency {}

fn constraint_text(specifiers: &Specifiers) -> String {
    if specifiers.is_empty() {
        "*".into()
    } else {
        specifiers.to_string()
    }
}

/// Turns dependency specification strings into Dependencies. Relative paths
/// are taken relative to `base_dir`.
#[derive(Debug, Clone)]
pub struct DependencyParser<F = LocalFilesystem> {
    base_dir: PathBuf,
    fs: F,
}

impl DependencyParser<LocalFilesystem> {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        DependencyParser::with_filesystem(base_dir, LocalFilesystem)
    }
}

impl<F: Filesystem> DependencyParser<F> {
    pub fn with_filesystem(base_dir: impl Into<PathBuf>, fs: F) -> Self {
        DependencyParser {
            base_dir: base_dir.into(),
            fs,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn parse(&self, spec: &str) -> Result<Dependency, DependencyParseError> {
        context!("parsing dependency {:?}", spec);

        let line = split_spec(spec);
        let parsed = ParsedRequirement::parse(&line, ParseExtra::Allowed)
            .map_err(|e| DependencyParseError::malformed(spec, e))?;
        trace!("parsed {:?} as {:?}", line, parsed);

        let classified = classify(&parsed, &self.base_dir, &self.fs)?;
        debug!("{:?} classified as {:?}", line, classified.source);

        let (name, source, constraint) = match (classified.source, &parsed) {
            (SourceClassification::PlainName, ParsedRequirement::Named(req)) => (
                req.name.clone(),
                Source::Plain,
                constraint_text(&req.specifiers),
            ),
            (SourceClassification::PlainName, ParsedRequirement::Location { location, .. }) => {
                return Err(DependencyParseError::MalformedRequirement {
                    input: spec.to_owned(),
                    reason: format!("{:?} is not a package name", location),
                });
            }
            (SourceClassification::RemoteUrl(raw), _) => {
                let link = link_from_url(&raw, &self.base_dir)
                    .map_err(|e| DependencyParseError::malformed(spec, e))?;
                self.resolve_link(&parsed, &link)?
            }
            (
                SourceClassification::LocalDirectory(path)
                | SourceClassification::LocalArchive(path),
                _,
            ) => {
                let link =
                    Link::from_path(&path).map_err(|e| DependencyParseError::malformed(spec, e))?;
                self.resolve_link(&parsed, &link)?
            }
        };

        let mut extras = IndexSet::new();
        if let ParsedRequirement::Named(req) = &parsed {
            extras.extend(req.extras.iter().cloned());
        }
        extras.extend(classified.path_extras);

        let marker = parsed.env_marker().cloned();
        let MarkerEffects {
            in_extras,
            python_versions,
        } = match &marker {
            Some(m) => translate(m)?,
            None => MarkerEffects {
                in_extras: Vec::new(),
                python_versions: "*".into(),
            },
        };

        let mut dep = Dependency {
            name,
            source,
            constraint,
            extras,
            in_extras: Vec::new(),
            python_versions,
            marker,
            activation: Activation::Active,
        };
        if !in_extras.is_empty() {
            dep.deactivate();
            dep.in_extras.extend(in_extras);
        }
        debug!("{:?} -> {}", spec, dep);
        Ok(dep)
    }

    fn resolve_link(
        &self,
        parsed: &ParsedRequirement,
        link: &Link,
    ) -> Result<(PackageName, Source, String), DependencyParseError> {
        // Only `name @ url` carries a real name; a bare archive filename in the
        // name slot isn't one.
        let declared = match parsed {
            ParsedRequirement::Named(req) if req.url.is_some() => Some(&req.name),
            _ => None,
        };

        Ok(match disambiguate(link)? {
            LinkKind::Wheel { name, version } => (name, Source::Plain, version.to_string()),
            LinkKind::Vcs { vcs, url, rev } => (
                derive_name(declared, link)?,
                Source::Vcs { vcs, url, rev },
                "*".into(),
            ),
            LinkKind::DirectUrl { url } => {
                (derive_name(declared, link)?, Source::Url { url }, "*".into())
            }
            LinkKind::Opaque => (derive_name(declared, link)?, Source::Plain, "*".into()),
        })
    }
}

/// Parse one dependency specification, with relative paths taken relative to
/// the current directory.
pub fn dependency_from_spec(spec: &str) -> Result<Dependency, DependencyParseError> {
    let base_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            warn!("can't find the current directory ({}); using '.'", e);
            PathBuf::from(".")
        }
    };
    DependencyParser::new(base_dir).parse(spec)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::project_dir;
    use indoc::indoc;

    fn parse_in(base: &Path, spec: &str) -> Dependency {
        DependencyParser::new(base).parse(spec).unwrap()
    }

    fn parse(spec: &str) -> Dependency {
        parse_in(Path::new("/nonexistent/base"), spec)
    }

    #[test]
    fn test_plain() {
        let dep = parse("Requests>=2.8.1,<3");
        assert_eq!(dep.name().as_given(), "Requests");
        assert_eq!(dep.base_name(), "requests");
        assert_eq!(dep.source(), &Source::Plain);
        assert_eq!(dep.constraint(), ">=2.8.1,<3");
        assert!(dep.in_extras().is_empty());
        assert_eq!(dep.python_versions(), "*");
        assert!(!dep.is_optional());

        assert_eq!(parse("requests").constraint(), "*");
        assert_eq!(parse("requests (>=1.0, <2)").constraint(), ">=1.0,<2");
    }

    #[test]
    fn test_markers() {
        let dep = parse(r#"sphinx; extra == "docs""#);
        assert_eq!(dep.in_extras(), ["docs"]);
        assert!(dep.is_optional());
        assert_eq!(dep.activation(), Activation::Optional);

        assert_eq!(
            parse(r#"pkg; python_version=="3.8""#).python_versions(),
            "~3.8"
        );
        assert_eq!(parse(r#"pkg; python_version<="3""#).python_versions(), "<4");
        assert_eq!(parse(r#"pkg; python_version<="3.8""#).python_versions(), "<3.9");
        assert_eq!(
            parse(r#"pkg; python_version in "2.7, 3.2, 3.3""#).python_versions(),
            "2.7.* || 3.2.* || 3.3.*"
        );

        let dep = parse(r#"pkg; extra == "fast" and python_version >= "3.7""#);
        assert!(dep.is_optional());
        assert_eq!(dep.in_extras(), ["fast"]);
        assert_eq!(dep.python_versions(), ">=3.7");

        // only branches that mention the interpreter constrain it
        assert_eq!(
            parse(r#"pkg; python_version < "3" or sys_platform == "win32""#).python_versions(),
            "<3"
        );
        let dep = parse(r#"pkg; extra == "a" or python_version < "3""#);
        assert_eq!(dep.python_versions(), "<3");
        assert_eq!(dep.in_extras(), ["a"]);

        // other variables ride along on the marker
        let dep = parse(r#"pywin32; sys_platform == "win32""#);
        assert_eq!(dep.python_versions(), "*");
        assert!(!dep.is_optional());
        assert!(dep.marker().is_some());
    }

    #[test]
    fn test_comments() {
        let dep = parse(r#"foo >= 1.0 # pinned; python_version < "3.8""#);
        assert_eq!(dep.constraint(), ">=1.0");
        assert_eq!(dep.python_versions(), "<3.8");

        let dep = parse("foo  # just a comment");
        assert!(dep.marker().is_none());

        let dep = parse("foo>=1.0#comment");
        assert_eq!(dep.constraint(), ">=1.0");
        assert!(dep.marker().is_none());
    }

    #[test]
    fn test_serialization() {
        let dep = parse(r#"requests[security]>=2.8.1,<3; python_version < "3" and extra == "net""#);
        insta::assert_json_snapshot!(dep, @r###"
        {
          "name": "requests",
          "source": {
            "kind": "plain"
          },
          "constraint": ">=2.8.1,<3",
          "extras": [
            "security"
          ],
          "in_extras": [
            "net"
          ],
          "python_versions": "<3",
          "marker": "(python_version < \"3\" and extra == \"net\")",
          "activation": "optional"
        }
        "###);
    }

    #[test]
    fn test_vcs() {
        let dep = parse("git+https://github.com/org/repo.git@v1.0#egg=pkgname");
        assert_eq!(dep.name().as_given(), "pkgname");
        assert_eq!(
            dep.source(),
            &Source::Vcs {
                vcs: "git".into(),
                url: Url::parse("https://github.com/org/repo.git").unwrap(),
                rev: Some("v1.0".into()),
            }
        );
        assert_eq!(dep.constraint(), "*");
        assert_eq!(
            dep.to_pep_508(),
            "pkgname @ git+https://github.com/org/repo.git@v1.0"
        );

        let dep = parse("git+https://github.com/org/repo.git@release/1.0#egg=pkg");
        assert!(matches!(
            dep.source(),
            Source::Vcs { url, rev: Some(rev), .. }
                if url.as_str() == "https://github.com/org/repo.git" && rev == "release/1.0"
        ));
        assert_eq!(
            dep.to_pep_508(),
            "pkg @ git+https://github.com/org/repo.git@release/1.0"
        );

        let dep = parse("mylib @ git+ssh://git@github.com/org/mylib.git");
        assert_eq!(dep.name().as_given(), "mylib");
        assert!(matches!(dep.source(), Source::Vcs { rev: None, .. }));
    }

    #[test]
    fn test_urls() {
        let dep = parse("foo[bar] @ https://example.com/foo-1.0.tar.gz#sha256=abcd ; os_name == 'nt'");
        assert_eq!(
            dep.source(),
            &Source::Url {
                url: Url::parse("https://example.com/foo-1.0.tar.gz").unwrap()
            }
        );
        assert_eq!(dep.extras().len(), 1);
        assert_eq!(
            dep.to_string(),
            r#"foo[bar] @ https://example.com/foo-1.0.tar.gz ; os_name == "nt""#
        );

        // name from the sdist filename
        let dep = parse("https://example.com/dist/Frob-2.0.zip");
        assert_eq!(dep.name().as_given(), "Frob");

        // schemes we can't represent fall back to a bare name
        let dep = parse("hg+https://example.com/repo#egg=thing");
        assert_eq!(dep.name().as_given(), "thing");
        assert_eq!(dep.source(), &Source::Plain);
        assert_eq!(dep.constraint(), "*");
    }

    #[test]
    fn test_wheels() {
        let dep = parse("foo-1.2.3-py3-none-any.whl");
        assert_eq!(dep.name().as_given(), "foo");
        assert_eq!(dep.constraint(), "1.2.3");
        assert_eq!(dep.python_versions(), "*");
        assert_eq!(dep.to_pep_508(), "foo==1.2.3");

        let dep = parse("https://example.com/wheels/bar-0.1-1-cp39-cp39-manylinux1_x86_64.whl");
        assert_eq!(dep.name().as_given(), "bar");
        assert_eq!(dep.constraint(), "0.1");

        for bad in ["./foo.whl", "https://example.com/foo-1.0.whl"] {
            let err = DependencyParser::new("/tmp").parse(bad).unwrap_err();
            assert!(
                matches!(err, DependencyParseError::InvalidWheelName { .. }),
                "{}: {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_local_paths() {
        let tmp = tempfile::tempdir().unwrap();
        project_dir(tmp.path(), "sub/pkg", Some("pyproject.toml"));
        project_dir(tmp.path(), "sub/empty", None);

        let dep = parse_in(tmp.path(), "./sub/pkg[cli]");
        assert_eq!(dep.name().as_given(), "pkg");
        assert_eq!(dep.source(), &Source::Plain);
        assert_eq!(dep.constraint(), "*");
        assert_eq!(dep.extras().iter().next().unwrap().as_given(), "cli");

        let err = DependencyParser::new(tmp.path()).parse("./sub/empty").unwrap_err();
        assert!(matches!(err, DependencyParseError::InvalidLocalPackage { .. }));

        let dep = parse_in(tmp.path(), "dist/thing-3.1.tar.gz");
        assert_eq!(dep.name().as_given(), "thing");

        // relative file: links are relative to the base directory
        let dep = parse_in(&tmp.path().join("sub/pkg"), "file:../pkg#egg=pkg");
        assert_eq!(dep.name().as_given(), "pkg");
    }

    struct FakeFs {
        projects: Vec<PathBuf>,
    }

    impl Filesystem for FakeFs {
        fn is_directory(&self, path: &Path) -> bool {
            self.projects.iter().any(|p| p.starts_with(path))
        }

        fn has_build_descriptor(&self, dir: &Path) -> bool {
            self.projects.iter().any(|p| p == dir)
        }
    }

    #[test]
    fn test_custom_filesystem() {
        let parser = DependencyParser::with_filesystem(
            "/work",
            FakeFs {
                projects: vec![PathBuf::from("/work/libs/widget")],
            },
        );
        assert_eq!(parser.base_dir(), Path::new("/work"));

        let dep = parser.parse("./libs/widget").unwrap();
        assert_eq!(dep.name().as_given(), "widget");

        let err = parser.parse("./libs").unwrap_err();
        assert!(matches!(err, DependencyParseError::InvalidLocalPackage { .. }));
    }

    #[test]
    fn test_errors() {
        for bad in [
            "",
            "foo >= ",
            "foo[",
            "./nowhere/at/all",
            "foo; python_version <= 'x.y'",
            // no way to get a name out of this one
            "https://example.com/download",
        ] {
            let err = DependencyParser::new("/tmp").parse(bad).unwrap_err();
            assert!(
                matches!(err, DependencyParseError::MalformedRequirement { .. }),
                "{:?}: {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_deactivate_is_idempotent() {
        let mut dep = parse(r#"foo; extra == "a" or extra == "a""#);
        assert_eq!(dep.in_extras(), ["a", "a"]);
        let before = dep.clone();
        dep.deactivate();
        dep.deactivate();
        assert_eq!(dep, before);

        let mut dep = parse("foo");
        dep.deactivate();
        assert!(dep.is_optional());
        assert!(dep.in_extras().is_empty());
    }

    #[test]
    fn test_marker_matches() {
        let dep = parse(r#"foo; os_name == "nt" and python_version >= "3.8""#);
        let mut env: HashMap<String, String> = HashMap::new();
        env.insert("os_name".into(), "nt".into());
        env.insert("python_version".into(), "3.10".into());
        assert!(dep.marker_matches(&env).unwrap());

        env.insert("python_version".into(), "3.7".into());
        assert!(!dep.marker_matches(&env).unwrap());

        env.remove("os_name");
        assert!(dep.marker_matches(&env).is_err());

        assert!(parse("foo").marker_matches(&env).unwrap());
    }

    #[test]
    fn test_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let specs = indoc! {r#"
            requests[security,socks]>=2.8.1,<3; python_version < "3" and extra == "net"
            pkg; python_version in "2.7, 3.2, 3.3" or python_version >= "3.6"
            git+https://github.com/org/repo.git@v1.0#egg=pkgname
            git://github.com/org/repo.git#egg=repo ; sys_platform == "linux"
            foo @ https://example.com/foo-1.0.tar.gz ; extra == "x"
            dist/foo-1.2.3-py3-none-any.whl; python_version > "2.7"
        "#};
        for spec in specs.lines() {
            let dep = parse_in(tmp.path(), spec);
            let again = parse_in(tmp.path(), &dep.to_pep_508());
            assert_eq!(dep, again, "{} -> {}", spec, dep.to_pep_508());
        }
    }

    #[test]
    fn test_from_current_dir() {
        let dep = dependency_from_spec("trio>=0.22").unwrap();
        assert_eq!(dep.constraint(), ">=0.22");
    }
}
