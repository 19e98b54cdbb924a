use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{Error, Result};

mod form;

use self::form::extract_saml_response;

pub const ASSERTION_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// The raw answer of the identity provider to the sign-on request.
#[derive(Debug)]
pub struct AuthResponse {
    pub status: u16,
    pub body: String,
}

/// SAMLAssertion holds the decoded assertion document together with the
/// base64 text STS expects. Its contents are never printed.
pub struct SAMLAssertion {
    encoded: String,
    xml: String,
}

impl SAMLAssertion {
    /// Decodes the base64 value of a `SAMLResponse` field and checks that the
    /// result is a well-formed XML document.
    pub fn from_base64(value: &str) -> Result<Self> {
        let encoded: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();

        if encoded.is_empty() {
            return Err(Error::malformed_assertion("the SAMLResponse value is empty"));
        }

        let bytes = STANDARD
            .decode(&encoded)
            .map_err(|e| Error::malformed_assertion(&format!("invalid base64: {}", e)))?;
        let xml = String::from_utf8(bytes)
            .map_err(|e| Error::malformed_assertion(&format!("not valid UTF-8: {}", e)))?;

        let assertion = SAMLAssertion { encoded, xml };
        assertion.document()?;

        Ok(assertion)
    }

    /// Parses the assertion into an XML tree.
    pub fn document(&self) -> Result<roxmltree::Document<'_>> {
        roxmltree::Document::parse(&self.xml)
            .map_err(|e| Error::malformed_assertion(&format!("invalid XML: {}", e)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.xml.as_bytes()
    }

    /// The base64 form handed to the assume-role call.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Debug for SAMLAssertion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SAMLAssertion")
            .field("len", &self.xml.len())
            .finish()
    }
}

/// Locates and decodes the SAML assertion embedded in an authentication response.
pub fn extract(response: &AuthResponse) -> Result<SAMLAssertion> {
    if response.status != 200 {
        debug!("extract.status={}", response.status);
        return Err(Error::authentication_failed(response.status));
    }

    let value = extract_saml_response(&response.body).ok_or_else(|| {
        debug!("extract.no_saml_response");
        Error::malformed_assertion("no SAMLResponse field found in the identity provider response")
    })?;

    trace!("extract.decode len={}", value.len());
    SAMLAssertion::from_base64(&value)
}
