use std::fmt;

use chrono::{DateTime, FixedOffset};

use crate::error::Result;
use crate::resolve::ResolvedRole;
use crate::saml::SAMLAssertion;

pub mod credentials;
pub mod sts;

/// Temporary credentials returned by STS.
#[derive(Deserialize, Clone, PartialEq)]
pub struct Credentials {
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,
    #[serde(rename = "SessionToken")]
    pub session_token: String,
    #[serde(rename = "Expiration")]
    pub expiration: String,
}

impl Credentials {
    pub fn expires_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.expiration).ok()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

/// Exchanges a SAML assertion for temporary credentials of the resolved role.
pub trait AssumeRoleWithSaml {
    fn assume_role_with_saml(
        &self,
        role: &ResolvedRole,
        assertion: &SAMLAssertion,
        region: &str,
    ) -> Result<Credentials>;
}
