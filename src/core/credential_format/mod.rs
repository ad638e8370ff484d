use core::fmt;
use std::{borrow::Cow, str::FromStr};

use serde::{Deserialize, Serialize};

const FORMAT_JWT: &str = "jwt";
const FORMAT_JWT_VC: &str = "jwt_vc";
const FORMAT_JWT_VP: &str = "jwt_vp";
const FORMAT_LDP: &str = "ldp";
const FORMAT_LDP_VC: &str = "ldp_vc";
const FORMAT_LDP_VP: &str = "ldp_vp";

/// Claim format designation written into each descriptor map entry of a
/// presentation submission.
///
/// Registry of claim format types: <https://identity.foundation/claim-format-registry/#registry>
///
/// The evaluation pipeline only ever produces JSON-LD credentials, so
/// [`ClaimFormatDesignation::LdpVc`] is the default. Other designations are
/// kept so that submissions produced elsewhere round-trip without loss.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClaimFormatDesignation {
    /// A JSON Web Token submitted as an encoded string.
    Jwt,

    /// A W3C Verifiable Credential secured as a JWT.
    JwtVc,

    /// A W3C Verifiable Presentation secured as a JWT.
    JwtVp,

    /// A Linked-Data Proof submitted as an object.
    Ldp,

    /// A W3C Verifiable Credential secured with a Linked-Data Proof,
    /// submitted as a JSON object.
    #[default]
    LdpVc,

    /// See [`ClaimFormatDesignation::LdpVc`].
    LdpVp,

    /// Any designation not listed above, by name.
    Other(String),
}

impl ClaimFormatDesignation {
    pub fn from_name(name: Cow<str>) -> Self {
        match name.as_ref() {
            FORMAT_JWT => Self::Jwt,
            FORMAT_JWT_VC => Self::JwtVc,
            FORMAT_JWT_VP => Self::JwtVp,
            FORMAT_LDP => Self::Ldp,
            FORMAT_LDP_VC => Self::LdpVc,
            FORMAT_LDP_VP => Self::LdpVp,
            _ => Self::Other(name.into_owned()),
        }
    }

    /// Registered name of the designation, e.g. `ldp_vc`.
    pub fn name(&self) -> &str {
        match self {
            Self::Jwt => FORMAT_JWT,
            Self::JwtVc => FORMAT_JWT_VC,
            Self::JwtVp => FORMAT_JWT_VP,
            Self::Ldp => FORMAT_LDP,
            Self::LdpVc => FORMAT_LDP_VC,
            Self::LdpVp => FORMAT_LDP_VP,
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for ClaimFormatDesignation {
    fn from(s: &str) -> Self {
        Self::from_name(Cow::Borrowed(s))
    }
}

impl From<String> for ClaimFormatDesignation {
    fn from(value: String) -> Self {
        Self::from_name(Cow::Owned(value))
    }
}

impl FromStr for ClaimFormatDesignation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}

impl fmt::Display for ClaimFormatDesignation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

impl Serialize for ClaimFormatDesignation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.name().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ClaimFormatDesignation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Into::into)
    }
}
