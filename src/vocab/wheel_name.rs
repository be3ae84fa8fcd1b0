use crate::prelude::*;

// https://packaging.python.org/specifications/binary-distribution-format/#file-name-convention
//
//   {distribution}-{version}(-{build tag})?-{python tag}-{abi tag}-{platform tag}.whl
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct WheelName {
    pub distribution: PackageName,
    pub version: Version,
    // PEP 427 says the build tag "sorts as an empty tuple if
    // unspecified, else sort as a two-item tuple with the first item being
    // the initial digits as an 'int', and the second item being the remainder
    // of the tag as a 'str'". This is ill-defined, b/c what the heck do
    // you do if there aren't any initial digits? So instead we do:
    //
    //   <no build tag> => (None, "")
    //   1              => (Some(1), "")
    //   1stuff         => (Some(1), "stuff")
    //   stuff          => (None, "stuff")
    pub build_number: Option<u32>,
    pub build_name: String,
    // Vec rather than a set: keeps the order they were written in, and
    // duplicates don't matter.
    pub py_tags: Vec<String>,
    pub abi_tags: Vec<String>,
    pub arch_tags: Vec<String>,
}

impl WheelName {
    pub fn compressed_tag(&self) -> String {
        format!(
            "{}-{}-{}",
            self.py_tags.join("."),
            self.abi_tags.join("."),
            self.arch_tags.join(".")
        )
    }
}

impl TryFrom<&str> for WheelName {
    type Error = eyre::Report;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // names/versions/etc. will be further validated by their respective
        // constructors. This is just to rule out real ridiculous stuff, like
        // spaces or control characters.
        static VALID_CHARS: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.+!-]*$").unwrap());
        static BUILD_TAG_SPLIT: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"(^[0-9]*)(.*)$").unwrap());

        if !VALID_CHARS.is_match(value) {
            bail!("Invalid characters in wheel name {:?}", value);
        }

        let stem = value
            .strip_suffix(".whl")
            .ok_or_else(|| eyre!("expected {:?} to end in .whl", value))?;

        let mut pieces: Vec<&str> = stem.split('-').collect();

        let build_tag = if pieces.len() == 6 { pieces.remove(2) } else { "" };
        if pieces.len() != 5 {
            bail!("can't parse wheel name {:?}", value);
        }
        if pieces.iter().any(|p| p.is_empty()) {
            bail!("empty component in wheel name {:?}", value);
        }

        let (build_number, build_name) = match BUILD_TAG_SPLIT.captures(build_tag) {
            Some(captures) => (
                captures.get(1).and_then(|m| m.as_str().parse().ok()),
                captures.get(2).map_or("", |m| m.as_str()).to_owned(),
            ),
            None => (None, String::new()),
        };

        fn split_compressed(tag: &str) -> Vec<String> {
            tag.split('.').map(|p| p.into()).collect()
        }

        Ok(WheelName {
            distribution: pieces[0].try_into()?,
            version: pieces[1].try_into()?,
            build_number,
            build_name,
            py_tags: split_compressed(pieces[2]),
            abi_tags: split_compressed(pieces[3]),
            arch_tags: split_compressed(pieces[4]),
        })
    }
}

try_from_str_boilerplate!(WheelName);

impl Display for WheelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let build_tag = match (self.build_number, &self.build_name[..]) {
            (None, "") => String::from(""),
            (None, name) => format!("-{}", name),
            (Some(num), name) => format!("-{}{}", num, name),
        };
        write!(
            f,
            "{dist}-{ver}{build}-{ctag}.whl",
            dist = self.distribution,
            ver = self.version,
            build = build_tag,
            ctag = self.compressed_tag()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wheel_name_from_str() {
        let wn: WheelName = "trio-0.18.0-py3-none-any.whl".try_into().unwrap();
        assert_eq!(wn.distribution, "trio".try_into().unwrap());
        assert_eq!(wn.version, "0.18.0".try_into().unwrap());
        assert_eq!(wn.build_number, None);
        assert_eq!(wn.build_name, "");
        assert_eq!(wn.py_tags, vec!["py3"]);
        assert_eq!(wn.abi_tags, vec!["none"]);
        assert_eq!(wn.arch_tags, vec!["any"]);

        assert_eq!(wn.to_string(), "trio-0.18.0-py3-none-any.whl");
    }

    #[test]
    fn test_wheel_name_from_str_harder() {
        let wn: WheelName = "foo.bar-0.1b3-1local-py2.py3-none-any.whl"
            .try_into()
            .unwrap();
        assert_eq!(wn.distribution, "foo.bar".try_into().unwrap());
        assert_eq!(wn.version, "0.1b3".try_into().unwrap());
        assert_eq!(wn.build_number, Some(1));
        assert_eq!(wn.build_name, "local");
        assert_eq!(wn.py_tags, vec!["py2", "py3"]);
        assert_eq!(wn.compressed_tag(), "py2.py3-none-any");

        assert_eq!(wn.to_string(), "foo.bar-0.1b3-1local-py2.py3-none-any.whl");
    }

    #[test]
    fn test_bad_wheel_names() {
        for bad in [
            "foo.whl",
            "foo-1.0.whl",
            "foo-1.0-py3-none.whl",
            "foo-bar-1.0-x-py3-none-any.whl",
            "foo-notaversion-py3-none-any.whl",
            "foo-1.0--none-any.whl",
            "foo 1.0-py3-none-any.whl",
            "foo-1.0-py3-none-any.zip",
        ] {
            assert!(WheelName::try_from(bad).is_err(), "{:?} should fail", bad);
        }
    }
}
