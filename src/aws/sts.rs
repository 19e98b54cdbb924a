use std::io::{self, BufWriter, Write};
use std::process::{ChildStdin, Command, Stdio};

use super::{AssumeRoleWithSaml, Credentials};
use crate::error::{Error, ErrorKind, Result};
use crate::resolve::ResolvedRole;
use crate::saml::SAMLAssertion;

#[derive(Deserialize)]
struct AssumeRoleWithSamlOutput {
    #[serde(rename = "Credentials")]
    credentials: Credentials,
}

/// Calls `aws sts assume-role-with-saml` of the installed AWS CLI.
pub struct AwsCli {
    program: String,
    session_duration: Option<i64>,
}

impl AwsCli {
    pub fn new(session_duration: Option<i64>) -> Self {
        AwsCli {
            program: "aws".into(),
            session_duration,
        }
    }

    fn new_command(&self, role: &ResolvedRole, region: &str) -> Command {
        let mut c = Command::new(&self.program);

        c.arg("sts")
            .arg("assume-role-with-saml")
            .arg("--no-sign-request")
            .arg("--region")
            .arg(region)
            .arg("--role-arn")
            .arg(&role.role_arn)
            .arg("--principal-arn")
            .arg(&role.principal_arn)
            .arg("--output")
            .arg("json")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(duration) = self.session_duration {
            c.arg("--duration-seconds").arg(duration.to_string());
        }

        c
    }
}

impl AssumeRoleWithSaml for AwsCli {
    fn assume_role_with_saml(
        &self,
        role: &ResolvedRole,
        assertion: &SAMLAssertion,
        region: &str,
    ) -> Result<Credentials> {
        let mut c = self.new_command(role, region);

        // keep the assertion out of the process list where stdin can carry it
        if cfg!(unix) {
            c.arg("--saml-assertion")
                .arg("file:///dev/stdin")
                .stdin(Stdio::piped());
        } else {
            c.arg("--saml-assertion")
                .arg(assertion.encoded())
                .stdin(Stdio::null());
        }

        debug!("assume_role_with_saml.spawn role={}", role.role_arn);
        let mut child = c.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::new(
                ErrorKind::Sts,
                "aws binary not found in PATH. Did you install the AWS CLI?",
            ),
            _ => Error::new(ErrorKind::Sts, &format!("i/o error {}", e)),
        })?;

        let written = match child.stdin.take() {
            Some(stdin) => write_assertion(stdin, assertion),
            None => Ok(()),
        };

        // always reap the child, even when it stopped reading its stdin
        let output = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("assume_role_with_saml.status={:?}", output.status.code());

            return Err(Error::new(
                ErrorKind::Sts,
                &format!("AssumeRoleWithSAML failed: {}", stderr.trim()),
            ));
        }

        if let Err(e) = written {
            debug!("assume_role_with_saml.write_failed");
            return Err(Error::new(
                ErrorKind::Sts,
                &format!("Could not pass the SAML assertion to the AWS CLI: {}", e),
            ));
        }

        parse_output(&stdout)
    }
}

fn write_assertion(stdin: ChildStdin, assertion: &SAMLAssertion) -> io::Result<()> {
    let mut writer = BufWriter::new(stdin);
    writer.write_all(assertion.encoded().as_bytes())?;
    writer.flush()
}

fn parse_output(stdout: &str) -> Result<Credentials> {
    serde_json::from_str::<AssumeRoleWithSamlOutput>(stdout)
        .map(|o| o.credentials)
        .map_err(|e| {
            Error::new(
                ErrorKind::Sts,
                &format!("Could not read the AssumeRoleWithSAML response: {}", e),
            )
        })
}
