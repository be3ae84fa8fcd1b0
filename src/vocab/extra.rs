// 'Extra' string format is not well specified. It looks like what pip does is
// run things through pkg_resources.safe_extra, which does:
//
//   re.sub('[^A-Za-z0-9.-]+', '_', extra).lower()
//
// OTOH, PEP 508's grammar for requirement specifiers says that extras have to
// be "identifiers", which means: first char [A-Za-z0-9], remaining chars also
// allowed to include -_.
//
// So for now they act the same as package names: compared by their normalized
// form, displayed as given.

use crate::prelude::*;

#[derive(
    Debug, Clone, Hash, PartialEq, Eq, DeserializeFromStr, SerializeDisplay,
)]
pub struct Extra(PackageName);

impl Extra {
    pub fn as_given(&self) -> &str {
        self.0.as_given()
    }

    pub fn normalized(&self) -> &str {
        self.0.normalized()
    }
}

impl TryFrom<&str> for Extra {
    type Error = eyre::Report;

    fn try_from(s: &str) -> Result<Self> {
        let p: PackageName =
            s.try_into().wrap_err_with(|| format!("invalid extra {:?}", s))?;
        Ok(Extra(p))
    }
}

try_from_str_boilerplate!(Extra);

impl Display for Extra {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_given())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_extra_compares_normalized() {
        let a: Extra = "Socks_Proxy".try_into().unwrap();
        let b: Extra = "socks-proxy".try_into().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_given(), "Socks_Proxy");
        assert_eq!(a.to_string(), "Socks_Proxy");

        let mut set = IndexSet::new();
        set.insert(a);
        assert!(!set.insert(b));
        assert!("not valid!".parse::<Extra>().is_err());
    }
}
