use crate::prelude::*;
use std::hash::{Hash, Hasher};

// We lean on the 'pep440' crate for the heavy lifting part of representing
// versions, but wrap it in our own type so that we can e.g. make it Hashable
// and bolt on the bits of release-segment arithmetic that marker translation
// needs.

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Version(pub pep440::Version);

pub static VERSION_ZERO: Lazy<Version> = Lazy::new(|| "0a0.dev0".try_into().unwrap());

pub static VERSION_INFINITY: Lazy<Version> = Lazy::new(|| {
    // Technically there is no largest PEP 440 version. But this should be good
    // enough that no-one will notice the difference...
    let mut v = release(u32::MAX, &[u32::MAX, u32::MAX, u32::MAX]);
    v.post = Some(u32::MAX);
    Version(v)
});

fn release(epoch: u32, segments: &[u32]) -> pep440::Version {
    pep440::Version {
        epoch,
        release: segments.to_vec(),
        pre: None,
        post: None,
        dev: None,
        local: vec![],
    }
}

impl Version {
    // XX BUG IN pep440 crate: the actual smallest post-prefix is .post0. And X.Y.post0
    // is strictly larger than X.Y. BUT, PEP 440 treats these as the same.
    pub const SMALLEST_POST: Option<u32> = Some(1);

    /// How many release segments were written out: "3" is 1, "3.8" is 2, "3.8.1"
    /// is 3.
    pub fn precision(&self) -> usize {
        self.0.release.len()
    }

    pub fn major(&self) -> u32 {
        self.0.release.first().copied().unwrap_or(0)
    }

    pub fn minor(&self) -> u32 {
        self.0.release.get(1).copied().unwrap_or(0)
    }

    /// "3.8.1" -> "4"
    pub fn next_major(&self) -> Result<Version> {
        let major = self
            .major()
            .checked_add(1)
            .ok_or_else(|| eyre!("no release after {}", self))?;
        Ok(Version(release(self.0.epoch, &[major])))
    }

    /// "3.8.1" -> "3.9", "3" -> "3.1"
    pub fn next_minor(&self) -> Result<Version> {
        let minor = self
            .minor()
            .checked_add(1)
            .ok_or_else(|| eyre!("no minor release after {}", self))?;
        Ok(Version(release(self.0.epoch, &[self.major(), minor])))
    }

    /// Returns the smallest PEP 440 version that is larger than self.
    pub fn next(&self) -> Version {
        let mut new = self.clone();
        // The rules are here:
        //
        //   https://www.python.org/dev/peps/pep-0440/#summary-of-permitted-suffixes-and-relative-ordering
        //
        // - You can't attach a .postN after a .devN. So if you have a .devN,
        //   then the next possible version is .dev(N+1)
        //
        // - You can't attach a .postN after a .postN. So if you already have
        //   a .postN, then the next possible value is .post(N+1).
        //
        // - You *can* attach a .postN after anything else. So to get the next
        //   possible value, attach a .post0.
        if let Some(dev) = &mut new.0.dev {
            *dev += 1;
        } else if let Some(post) = &mut new.0.post {
            *post += 1;
        } else {
            new.0.post = Version::SMALLEST_POST;
        }
        new
    }
}

impl TryFrom<&str> for Version {
    type Error = eyre::Report;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        pep440::Version::parse(value)
            .map(Version)
            .ok_or_else(|| eyre!("Failed to parse PEP 440 version {:?}", value))
    }
}

try_from_str_boilerplate!(Version);

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // This is pretty inefficient compared to hashing the elements
        // individually, but that gets awkward because there are embedded
        // enums that aren't hashable either.
        self.0.normalize().hash(state)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_precision_and_bumps() {
        let v: Version = "3".parse().unwrap();
        assert_eq!(v.precision(), 1);
        assert_eq!(v.next_major().unwrap().to_string(), "4");
        assert_eq!(v.next_minor().unwrap().to_string(), "3.1");

        let v: Version = "3.8".parse().unwrap();
        assert_eq!(v.precision(), 2);
        assert_eq!(v.next_major().unwrap().to_string(), "4");
        assert_eq!(v.next_minor().unwrap().to_string(), "3.9");

        let v: Version = "2.7.18".parse().unwrap();
        assert_eq!(v.precision(), 3);
        assert_eq!(v.next_minor().unwrap().to_string(), "2.8");

        let v: Version = "4294967295.4294967295".parse().unwrap();
        assert!(v.next_major().is_err());
        assert!(v.next_minor().is_err());
        let v: Version = "1.4294967295".parse().unwrap();
        assert_eq!(v.next_major().unwrap().to_string(), "2");
    }

    #[test]
    fn test_next_is_strictly_larger() {
        for s in ["1.0", "1.0.post1", "1.0.dev3", "2a1"] {
            let v: Version = s.parse().unwrap();
            assert!(v.next() > v, "{}", s);
        }
        assert!(*VERSION_ZERO < "0.0.1".parse().unwrap());
        assert!(*VERSION_INFINITY > "9999.9999".parse().unwrap());
    }

    #[test]
    fn test_invalid_version() {
        assert!("not a version".parse::<Version>().is_err());
    }
}
