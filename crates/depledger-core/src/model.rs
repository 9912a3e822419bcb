use serde::{Deserialize, Serialize};

pub const MANIFEST_SCHEMA_VERSION: &str = "depledger.manifest@0.1.0";

/// Classification of a license's primary link. Fresh extractions always start
/// `Unspecified`; promoting a link to any other state is a human decision that
/// lives in the persisted manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrimaryLinkType {
    #[default]
    Unspecified,
    ScrapeDirectly,
    ScrapeFromLocalCopy,
    NeedsIntervention,
    InvalidLink,
    Unrecognized,
}

impl PrimaryLinkType {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimaryLinkType::Unspecified => "UNSPECIFIED",
            PrimaryLinkType::ScrapeDirectly => "SCRAPE_DIRECTLY",
            PrimaryLinkType::ScrapeFromLocalCopy => "SCRAPE_FROM_LOCAL_COPY",
            PrimaryLinkType::NeedsIntervention => "NEEDS_INTERVENTION",
            PrimaryLinkType::InvalidLink => "INVALID_LINK",
            PrimaryLinkType::Unrecognized => "UNRECOGNIZED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecondaryLinkType {
    #[default]
    Unspecified,
    Valid,
    Unrecognized,
}

impl SecondaryLinkType {
    pub fn as_str(self) -> &'static str {
        match self {
            SecondaryLinkType::Unspecified => "UNSPECIFIED",
            SecondaryLinkType::Valid => "VALID",
            SecondaryLinkType::Unrecognized => "UNRECOGNIZED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseOrigin {
    #[default]
    Unknown,
    Manual,
    PartiallyFromPom,
    EntirelyFromPom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub license_name: String,
    pub primary_link: String,
    #[serde(default)]
    pub primary_link_type: PrimaryLinkType,
    #[serde(default)]
    pub secondary_link: String,
    #[serde(default)]
    pub secondary_link_type: SecondaryLinkType,
    #[serde(default)]
    pub secondary_license_name: String,
}

impl License {
    /// A license as it comes out of a POM scan: name and link only, everything
    /// else left for the curator to fill in.
    pub fn from_pom(license_name: String, primary_link: String) -> Self {
        License {
            license_name,
            primary_link,
            primary_link_type: PrimaryLinkType::Unspecified,
            secondary_link: String::new(),
            secondary_link_type: SecondaryLinkType::Unspecified,
            secondary_license_name: String::new(),
        }
    }

    /// True when the entry cannot be acted on without a curator: the primary
    /// link was never classified, or a local-copy/intervention link is missing
    /// its secondary details.
    pub fn is_broken(&self) -> bool {
        match self.primary_link_type {
            PrimaryLinkType::Unspecified | PrimaryLinkType::Unrecognized => true,
            PrimaryLinkType::ScrapeFromLocalCopy | PrimaryLinkType::NeedsIntervention => {
                self.secondary_link.is_empty()
                    || self.secondary_license_name.is_empty()
                    || !matches!(self.secondary_link_type, SecondaryLinkType::Valid)
            }
            PrimaryLinkType::ScrapeDirectly | PrimaryLinkType::InvalidLink => false,
        }
    }

    /// Licenses counted as "manual" for origin classification.
    pub fn needs_manual_work(&self) -> bool {
        matches!(
            self.primary_link_type,
            PrimaryLinkType::NeedsIntervention | PrimaryLinkType::InvalidLink
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MavenDependency {
    pub index: u32,
    /// Full coordinate string exactly as it appears in the lock file.
    pub artifact_name: String,
    pub artifact_version: String,
    #[serde(default)]
    pub license: Vec<License>,
    #[serde(default)]
    pub origin_of_license: LicenseOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: String,
    #[serde(default)]
    pub dependencies: Vec<MavenDependency>,
}

impl Manifest {
    pub fn empty() -> Self {
        Manifest {
            schema_version: MANIFEST_SCHEMA_VERSION.to_string(),
            dependencies: Vec::new(),
        }
    }

    pub fn license_count(&self) -> usize {
        self.dependencies.iter().map(|dep| dep.license.len()).sum()
    }
}
