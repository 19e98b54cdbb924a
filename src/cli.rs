use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Sets the level of verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    /// Skip using the password manager (for unsupported platforms)
    #[arg(long, global = true)]
    pub skip_password_manager: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure awsaml
    Configure,

    /// Sign on and store temporary credentials for a role
    Login(LoginArgs),

    /// List the roles the assertion grants
    Roles(LoginArgs),
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// IdP-initiated sign-on URL of AD FS
    #[arg(long, env = "IDP_URL")]
    pub idp_url: Option<String>,

    /// AWS region of the profile
    #[arg(short, long, env = "AWS_DEFAULT_REGION")]
    pub region: Option<String>,

    /// Role to assume; without it you are asked to choose
    #[arg(long, env = "AWS_ROLE_ARN")]
    pub role_arn: Option<String>,

    /// Directory username
    #[arg(short, long, env = "AD_USER")]
    pub username: Option<String>,

    /// Directory password
    #[arg(short = 'P', long, env = "AD_PWD", hide_env_values = true)]
    pub password: Option<String>,

    /// Directory holding the AWS config and credentials files
    #[arg(long, env = "AWS_DIR")]
    pub aws_dir: Option<String>,

    /// Read the sign-on page from a file instead of the IdP
    #[arg(long, value_name = "FILE")]
    pub response_file: Option<PathBuf>,

    /// Do not verify the IdP certificate (dev/test only)
    #[arg(long)]
    pub insecure: bool,

    /// Session duration in seconds
    #[arg(short = 'd', long)]
    pub session_duration: Option<i64>,

    /// Output format written to the profile
    #[arg(long)]
    pub output_format: Option<String>,
}
