//! Jurisdiction - Type-safe jurisdiction codes
//!
//! Unlike currency codes, unknown jurisdictions are rejected: a rule keyed
//! on a typo would never match and silently turn into a config gap.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing jurisdictions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JurisdictionError {
    #[error("Empty jurisdiction code")]
    EmptyCode,

    #[error("Unknown jurisdiction code: {0}")]
    Unknown(String),
}

/// Jurisdiction codes
///
/// # Examples
/// ```
/// use pulse_core::Jurisdiction;
///
/// let us: Jurisdiction = "us".parse().unwrap();
/// assert_eq!(us, Jurisdiction::Us);
/// assert_eq!(Jurisdiction::Eu.to_string(), "EU");
/// assert!("XX".parse::<Jurisdiction>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Jurisdiction {
    /// United States
    Us,
    /// European Union
    Eu,
    /// United Kingdom
    Uk,
    /// Canada
    Ca,
    /// Japan
    Jp,
    /// China
    Cn,
    /// Singapore
    Sg,
    /// Australia
    Au,
    /// India
    In,
    /// Switzerland
    Ch,
    /// Brazil
    Br,
    /// Applies everywhere (e.g. PCI DSS)
    Global,
}

impl Jurisdiction {
    /// All known jurisdictions
    pub const ALL: [Jurisdiction; 12] = [
        Jurisdiction::Us,
        Jurisdiction::Eu,
        Jurisdiction::Uk,
        Jurisdiction::Ca,
        Jurisdiction::Jp,
        Jurisdiction::Cn,
        Jurisdiction::Sg,
        Jurisdiction::Au,
        Jurisdiction::In,
        Jurisdiction::Ch,
        Jurisdiction::Br,
        Jurisdiction::Global,
    ];

    /// Returns the jurisdiction code as a string slice
    pub fn code(&self) -> &'static str {
        match self {
            Jurisdiction::Us => "US",
            Jurisdiction::Eu => "EU",
            Jurisdiction::Uk => "UK",
            Jurisdiction::Ca => "CA",
            Jurisdiction::Jp => "JP",
            Jurisdiction::Cn => "CN",
            Jurisdiction::Sg => "SG",
            Jurisdiction::Au => "AU",
            Jurisdiction::In => "IN",
            Jurisdiction::Ch => "CH",
            Jurisdiction::Br => "BR",
            Jurisdiction::Global => "GLOBAL",
        }
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Jurisdiction {
    type Err = JurisdictionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_uppercase();

        if s.is_empty() {
            return Err(JurisdictionError::EmptyCode);
        }

        Jurisdiction::ALL
            .iter()
            .copied()
            .find(|j| j.code() == s)
            .ok_or(JurisdictionError::Unknown(s))
    }
}

impl TryFrom<String> for Jurisdiction {
    type Error = JurisdictionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Jurisdiction> for String {
    fn from(j: Jurisdiction) -> Self {
        j.code().to_string()
    }
}
