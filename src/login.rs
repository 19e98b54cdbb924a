use crate::adfs::{AdfsClient, IdentityProvider, SavedResponse};
use crate::aws::credentials::ProfileStore;
use crate::aws::sts::AwsCli;
use crate::aws::AssumeRoleWithSaml;
use crate::cli::LoginArgs;
use crate::config::{self, Settings};
use crate::error::{Error, ErrorKind, Result};
use crate::resolve::{extract_candidates, resolve, ResolvedRole, RoleCandidate, RoleChooser};
use crate::saml::{extract, SAMLAssertion};
use crate::ui::{self, ConsoleChooser};

/// Signs on with the IdP and returns the assertion with the roles it grants.
pub fn sign_on(
    args: &LoginArgs,
    settings: &Settings,
    skip_password_manager: bool,
) -> Result<(SAMLAssertion, Vec<RoleCandidate>)> {
    let response = match args.response_file {
        Some(ref path) => SavedResponse { path: path.clone() }.authenticate()?,
        None => {
            let username = settings
                .username
                .clone()
                .or_else(|| ui::prompt("Username", None))
                .ok_or_else(|| Error::new(ErrorKind::Config, "No username provided"))?;
            let password =
                config::resolve_password(&username, args.password.as_ref(), skip_password_manager)?;

            AdfsClient {
                url: &settings.idp_url,
                username: &username,
                password: &password,
                ssl_verification: settings.ssl_verification,
            }
            .authenticate()?
        }
    };

    let assertion = extract(&response)?;
    let candidates = extract_candidates(&assertion.document()?)?;
    debug!(
        "sign_on.assertion_len={} candidates={}",
        assertion.as_bytes().len(),
        candidates.len()
    );

    Ok((assertion, candidates))
}

/// Resolves the role, exchanges the assertion and persists the credentials.
pub fn exchange(
    assertion: &SAMLAssertion,
    candidates: Vec<RoleCandidate>,
    settings: &Settings,
    chooser: Option<&mut dyn RoleChooser>,
    sts: &dyn AssumeRoleWithSaml,
    store: &ProfileStore,
) -> Result<ResolvedRole> {
    let role = resolve(
        candidates,
        settings.desired_role_arn.as_deref(),
        &settings.region,
        chooser,
    )?;
    info!("resolved role {} as profile {}", role.role_arn, role.profile_key);

    let credentials = sts.assume_role_with_saml(&role, assertion, &settings.region)?;
    debug!("exchange.credentials={:?}", credentials);

    store.save(&role, &credentials, &settings.region, &settings.output_format)?;
    ui::print_summary(&role, &credentials, &store.export_file().display().to_string());

    Ok(role)
}

pub fn command(args: &LoginArgs, config_file: Option<&str>, skip_password_manager: bool) -> Result<()> {
    let cfg = config::load_or_default(config_file)?;
    let settings = Settings::from_sources(args, &cfg, ui::prompt)?;
    debug!("login.settings={:?}", settings);

    let (assertion, candidates) = sign_on(args, &settings, skip_password_manager)?;

    let mut chooser = ConsoleChooser::default();
    exchange(
        &assertion,
        candidates,
        &settings,
        Some(&mut chooser),
        &AwsCli::new(settings.session_duration),
        &ProfileStore::new(&settings.aws_dir),
    )?;

    Ok(())
}
