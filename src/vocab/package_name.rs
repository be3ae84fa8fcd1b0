use crate::prelude::*;

/// A distribution name, remembering both how it was spelled and its PEP 503
/// normalized form. Comparisons and hashing only look at the normalized form.
#[derive(Debug, Clone, DeserializeFromStr, SerializeDisplay, Derivative)]
#[derivative(Hash, PartialEq, Eq)]
pub struct PackageName {
    #[derivative(Hash = "ignore", PartialEq = "ignore")]
    as_given: String,
    normalized: String,
}

impl PackageName {
    pub fn as_given(&self) -> &str {
        &self.as_given
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn is_valid(s: &str) -> bool {
        NAME_VALIDATE.is_match(s)
    }
}

// https://packaging.python.org/specifications/core-metadata/#name
static NAME_VALIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i-u)^([A-Z0-9]|[A-Z0-9][A-Z0-9._-]*[A-Z0-9])$").unwrap()
});

impl TryFrom<&str> for PackageName {
    type Error = eyre::Report;

    fn try_from(as_given: &str) -> Result<Self, Self::Error> {
        // https://www.python.org/dev/peps/pep-0503/#normalized-names
        static NAME_NORMALIZE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"[-_.]+").unwrap());

        if !PackageName::is_valid(as_given) {
            bail!("Invalid package name {:?}", as_given);
        }
        let as_given = as_given.to_owned();

        let mut normalized = NAME_NORMALIZE.replace_all(&as_given, "-").to_string();
        normalized.make_ascii_lowercase();

        Ok(PackageName {
            as_given,
            normalized,
        })
    }
}

try_from_str_boilerplate!(PackageName);

impl Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_given)
    }
}
