use std::fs;
use std::path::PathBuf;

use reqwest::header;

use crate::client;
use crate::error::Result;
use crate::saml::AuthResponse;

/// AD FS only offers integrated authentication to browsers it recognises.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (compatible, MSIE 11, Windows NT 6.3; Trident/7.0; rv:11.0) like Gecko";

pub const DEFAULT_IDP_URL: &str =
    "https://ad_host.myorg.com/adfs/ls/IdpInitiatedSignOn.aspx?loginToRp=urn:amazon:webservices";

/// Source of the sign-on page carrying the SAML assertion.
pub trait IdentityProvider {
    fn authenticate(&self) -> Result<AuthResponse>;
}

/// Opens the IdP-initiated sign-on URL with the directory credentials,
/// following all redirects.
pub struct AdfsClient<'a> {
    pub url: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub ssl_verification: bool,
}

impl<'a> IdentityProvider for AdfsClient<'a> {
    fn authenticate(&self) -> Result<AuthResponse> {
        trace!("authenticate.start");
        let client = client::get_proxied_client_builder()?
            .danger_accept_invalid_certs(!self.ssl_verification)
            .build()?;

        debug!("authenticate.get url={}", self.url);
        let res = client
            .get(self.url)
            .header(header::USER_AGENT, USER_AGENT)
            .basic_auth(self.username, Some(self.password))
            .send()
            .map_err(|e| {
                error!("authenticate: {:?}", e);
                e
            })?;

        let status = res.status().as_u16();
        trace!("authenticate.status={}", status);

        Ok(AuthResponse {
            status,
            body: res.text()?,
        })
    }
}

/// A sign-on page saved from a browser session.
pub struct SavedResponse {
    pub path: PathBuf,
}

impl IdentityProvider for SavedResponse {
    fn authenticate(&self) -> Result<AuthResponse> {
        debug!("authenticate.read path={}", self.path.display());

        Ok(AuthResponse {
            status: 200,
            body: fs::read_to_string(&self.path)?,
        })
    }
}
