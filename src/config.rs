use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use crossterm::style::Stylize;
use keyring::Entry;

use crate::adfs::DEFAULT_IDP_URL;
use crate::cli::LoginArgs;
use crate::error::{Error, ErrorKind, Result};
use crate::ui::{prompt, prompt_password};

pub const DEFAULT_REGION: &str = "eu-west-1";
pub const DEFAULT_OUTPUT_FORMAT: &str = "json";

const KEYRING_SERVICE: &str = "awsaml";

/// Optional settings persisted in `awsaml.yml`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    filename: PathBuf,

    pub idp_url: Option<String>,
    pub region: Option<String>,
    pub role_arn: Option<String>,
    pub username: Option<String>,
    pub output_format: Option<String>,
    pub aws_dir: Option<String>,
    pub ssl_verification: Option<bool>,
    pub session_duration: Option<i64>,
}

/// Everything a sign-on run needs, after merging flags, environment,
/// the config file and prompts.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub idp_url: String,
    pub region: String,
    pub desired_role_arn: Option<String>,
    pub username: Option<String>,
    pub output_format: String,
    pub aws_dir: PathBuf,
    pub ssl_verification: bool,
    pub session_duration: Option<i64>,
}

fn default_filename() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".awsaml.yml"))
}

fn get_filename(paths: Vec<PathBuf>) -> Option<PathBuf> {
    paths.into_iter().find(|path| path.exists())
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

/// Loads the given config file, or the first of `./awsaml.yml` and
/// `~/.awsaml.yml` that exists.
pub fn load_or_default(explicit: Option<&str>) -> Result<Config> {
    if let Some(path) = explicit {
        return load(Path::new(path));
    }

    let mut candidates = vec![PathBuf::from("./awsaml.yml")];
    candidates.extend(default_filename());

    match get_filename(candidates) {
        Some(path) => load(&path),
        None => Ok(Config::default()),
    }
}

fn load(path: &Path) -> Result<Config> {
    debug!("config.load path={}", path.display());
    let mut f = File::open(path).map_err(|e| {
        Error::new(
            ErrorKind::Config,
            &format!("Could not open config file {}: {}", path.display(), e),
        )
    })?;

    let mut buf = String::new();
    f.read_to_string(&mut buf)?;

    let mut cfg = parse(&buf)
        .map_err(|e| Error::new(ErrorKind::Config, &format!("{}: {}", path.display(), e)))?;
    cfg.filename = path.to_owned();

    Ok(cfg)
}

fn parse(buf: &str) -> Result<Config> {
    if buf.trim().is_empty() {
        return Ok(Config::default());
    }

    serde_yaml::from_str::<Config>(buf).map_err(|e| Error::new(ErrorKind::Config, &e.to_string()))
}

impl Config {
    pub fn save(&self) -> Result<()> {
        let filename = match self.filename.as_os_str().is_empty() {
            true => default_filename().ok_or_else(|| {
                Error::new(ErrorKind::Config, "Could not determine the home directory")
            })?,
            false => self.filename.clone(),
        };

        let f = File::create(&filename)?;
        serde_yaml::to_writer(f, self).map_err(|e| Error::new(ErrorKind::Config, &e.to_string()))
    }
}

impl Settings {
    /// Flags and environment win over the config file, which wins over prompts.
    pub fn from_sources<P>(args: &LoginArgs, cfg: &Config, mut prompt: P) -> Result<Self>
    where
        P: FnMut(&str, Option<&str>) -> Option<String>,
    {
        let idp_url = non_empty(args.idp_url.as_ref())
            .or_else(|| non_empty(cfg.idp_url.as_ref()))
            .unwrap_or_else(|| DEFAULT_IDP_URL.into());
        url::Url::parse(&idp_url).map_err(|e| {
            Error::new(
                ErrorKind::Config,
                &format!("Invalid IdP URL {:?}: {}", idp_url, e),
            )
        })?;

        let region = non_empty(args.region.as_ref())
            .or_else(|| non_empty(cfg.region.as_ref()))
            .or_else(|| prompt("Region", Some(DEFAULT_REGION)))
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.into());

        let aws_dir = match non_empty(args.aws_dir.as_ref()).or_else(|| non_empty(cfg.aws_dir.as_ref())) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .map(|home| home.join(".aws"))
                .ok_or_else(|| {
                    Error::new(
                        ErrorKind::Config,
                        "Could not determine the home directory, please set AWS_DIR",
                    )
                })?,
        };

        Ok(Settings {
            idp_url,
            region,
            desired_role_arn: non_empty(args.role_arn.as_ref())
                .or_else(|| non_empty(cfg.role_arn.as_ref())),
            username: non_empty(args.username.as_ref()).or_else(|| non_empty(cfg.username.as_ref())),
            output_format: non_empty(args.output_format.as_ref())
                .or_else(|| non_empty(cfg.output_format.as_ref()))
                .unwrap_or_else(|| DEFAULT_OUTPUT_FORMAT.into()),
            aws_dir,
            ssl_verification: !args.insecure && cfg.ssl_verification.unwrap_or(true),
            session_duration: args.session_duration.or(cfg.session_duration),
        })
    }
}

pub fn get_password(username: &str) -> Result<String> {
    Ok(Entry::new(KEYRING_SERVICE, username)?.get_password()?)
}

pub fn set_password(username: &str, password: &str) -> Result<()> {
    Ok(Entry::new(KEYRING_SERVICE, username)?.set_password(password)?)
}

/// Password from the flags, the password manager or a hidden prompt, in that order.
pub fn resolve_password(
    username: &str,
    explicit: Option<&String>,
    skip_password_manager: bool,
) -> Result<String> {
    if let Some(password) = non_empty(explicit) {
        return Ok(password);
    }

    if !skip_password_manager {
        match get_password(username) {
            Ok(p) => return Ok(p),
            Err(e) => debug!("resolve_password.keyring: {}", e),
        }
    }

    prompt_password("Password")
}

pub fn interactive_create(explicit: Option<&str>, skip_password_manager: bool) -> Result<()> {
    let mut cfg = match load_or_default(explicit) {
        Ok(cfg) => cfg,
        Err(e) if e.kind == ErrorKind::Config && explicit.is_some() => Config {
            filename: PathBuf::from(explicit.unwrap_or_default()),
            ..Config::default()
        },
        Err(e) => return Err(e),
    };

    println!("\nWelcome to awsaml. Settings are saved in a YAML file, the password in your");
    println!(
        "password manager. The IdP URL must be {} of AD FS.\n",
        "the IdP-initiated sign-on URL".yellow()
    );

    let idp_url = cfg.idp_url.clone().unwrap_or_else(|| DEFAULT_IDP_URL.into());
    if let Some(idp_url) = prompt("IdP URL", Some(&idp_url)) {
        url::Url::parse(&idp_url)
            .map_err(|e| Error::new(ErrorKind::Config, &format!("Invalid IdP URL: {}", e)))?;
        cfg.idp_url = Some(idp_url);
    }

    let region = cfg.region.clone().unwrap_or_else(|| DEFAULT_REGION.into());
    cfg.region = prompt("Region", Some(&region));

    let role_arn = cfg.role_arn.clone().unwrap_or_default();
    cfg.role_arn = prompt("Role ARN (empty to choose on every login)", Some(&role_arn))
        .filter(|r| !r.is_empty());

    cfg.username = prompt("Username", cfg.username.clone().as_deref());

    if let (Some(username), false) = (cfg.username.as_ref(), skip_password_manager) {
        let password = prompt_password("Password")?;
        set_password(username, &password)?;
    }

    cfg.save()?;
    println!("\nAll set!\n");

    Ok(())
}
