use std::{fmt, str::FromStr};

use ash::vk::make_api_version;
use thiserror::Error;

/// Semantic version number with an optional patch component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("version string contains too many components")]
    TooManyComponents,
    #[error("version component '{0}' is not a number")]
    InvalidComponent(String),
}

impl Version {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            patch: None,
        }
    }

    pub const fn with_patch(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch: Some(patch),
        }
    }

    /// Packs the version into Vulkan's 32-bit encoding. A missing patch
    /// component is encoded as zero.
    pub fn to_vk(&self) -> u32 {
        make_api_version(0, self.major, self.minor, self.patch.unwrap_or(0))
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::default());
        }

        let components = s.split('.').collect::<Vec<_>>();
        if components.len() > 3 {
            return Err(VersionError::TooManyComponents);
        }

        let parse = |component: &str| {
            component
                .parse::<u32>()
                .map_err(|_| VersionError::InvalidComponent(component.to_owned()))
        };

        let major = parse(components[0])?;
        let minor = components.get(1).map(|c| parse(c)).transpose()?.unwrap_or(0);
        let patch = components.get(2).map(|c| parse(c)).transpose()?;

        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty() {
        let v = "".parse::<Version>().unwrap();
        assert_eq!(v.major, 0);
        assert_eq!(v.minor, 0);
        assert_eq!(v.patch, None);
    }

    #[test]
    fn parse_no_patch() {
        let v = "1.2".parse::<Version>().unwrap();
        assert_eq!(v, Version::new(1, 2));
    }

    #[test]
    fn parse_patch() {
        let v = "1.2.3".parse::<Version>().unwrap();
        assert_eq!(v, Version::with_patch(1, 2, 3));
    }

    #[test]
    fn parse_trailing_dot_fails() {
        assert!("1.2.".parse::<Version>().is_err());
    }

    #[test]
    fn parse_too_many_components_fails() {
        assert_eq!(
            "1.2.3.4".parse::<Version>(),
            Err(VersionError::TooManyComponents)
        );
    }

    #[test]
    fn parse_empty_components_fail() {
        assert!("..".parse::<Version>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for s in ["1.2", "1.2.3", "0.0", "10.20.30"] {
            let v = s.parse::<Version>().unwrap();
            assert_eq!(v.to_string(), s);
            assert_eq!(v.to_string().parse::<Version>().unwrap(), v);
        }
    }

    #[test]
    fn vulkan_encoding_defaults_missing_patch_to_zero() {
        assert_eq!(
            Version::new(1, 2).to_vk(),
            Version::with_patch(1, 2, 0).to_vk()
        );
    }
}
