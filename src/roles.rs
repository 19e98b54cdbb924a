use crate::cli::LoginArgs;
use crate::config::{self, Settings};
use crate::error::{Error, ErrorKind, Result};
use crate::login::sign_on;
use crate::resolve::RoleCandidate;
use crate::ui;

pub fn command(args: &LoginArgs, config_file: Option<&str>, skip_password_manager: bool) -> Result<()> {
    let cfg = config::load_or_default(config_file)?;
    let settings = Settings::from_sources(args, &cfg, ui::prompt)?;

    let (_, candidates) = sign_on(args, &settings, skip_password_manager)?;

    println!("{}", listing(&candidates, &settings.region)?);
    Ok(())
}

fn listing(candidates: &[RoleCandidate], region: &str) -> Result<String> {
    if candidates.is_empty() {
        return Err(Error::new(
            ErrorKind::NoRolesAvailable,
            "The SAML assertion does not grant any AWS role",
        ));
    }

    Ok(ui::roles_table(candidates, region))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_listing_without_roles_is_an_error() {
        let err = listing(&[], "eu-west-1").unwrap_err();

        assert_eq!(err.kind, ErrorKind::NoRolesAvailable);
    }

    #[test]
    fn test_listing() {
        let candidates = vec![RoleCandidate {
            role_arn: "arn:aws:iam::123456789012:role/MyRole".into(),
            principal_arn: "arn:aws:iam::123456789012:saml-provider/MyIdP".into(),
        }];

        let table = listing(&candidates, "eu-west-1").unwrap();

        assert!(table.contains("eu-west-1-123456789012-MyRole"));
    }
}
