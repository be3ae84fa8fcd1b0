use crate::prelude::*;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SdistFormat {
    Zip,
    TarGz,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SdistName {
    pub distribution: PackageName,
    pub version: Version,
    pub format: SdistFormat,
}

impl TryFrom<&str> for SdistName {
    type Error = eyre::Report;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // The name can have dashes in it (legacy sdists weren't normalized), the
        // version can't, so split on the last one.
        static SDIST_NAME_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^(.*)-([^-]*)\.(zip|tar\.gz)$").unwrap());

        let captures = SDIST_NAME_RE
            .captures(value)
            .ok_or_else(|| eyre!("invalid sdist name {:?}", value))?;
        let distribution: PackageName = captures[1].parse()?;
        let version: Version = captures[2].parse()?;
        let format = match &captures[3] {
            "zip" => SdistFormat::Zip,
            _ => SdistFormat::TarGz,
        };
        Ok(SdistName {
            distribution,
            version,
            format,
        })
    }
}

try_from_str_boilerplate!(SdistName);

impl Display for SdistName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}.{}",
            self.distribution.as_given(),
            self.version,
            match self.format {
                SdistFormat::Zip => "zip",
                SdistFormat::TarGz => "tar.gz",
            }
        )
    }
}
