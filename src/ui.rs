use std::io::{self, Write};

use crossterm::style::Stylize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::aws::Credentials;
use crate::error::{Error, ErrorKind, Result};
use crate::resolve::{profile_key, ResolvedRole, RoleCandidate, RoleChooser};

/// Asks a question on the terminal. An empty answer takes the default; on
/// end of input the default (or nothing) is returned.
pub fn prompt(question: &str, default: Option<&str>) -> Option<String> {
    loop {
        match default {
            Some(default) => print!("{} {} [{}]: ", "?".green(), question, default),
            None => print!("{} {}: ", "?".green(), question),
        }
        let _ = io::stdout().flush();

        let mut buf = String::new();
        match io::stdin().read_line(&mut buf) {
            Ok(0) | Err(_) => return default.map(|d| d.into()),
            Ok(_) => {}
        }

        let answer = buf.trim();
        if !answer.is_empty() {
            return Some(answer.into());
        }

        if let Some(default) = default {
            return Some(default.into());
        }
    }
}

pub fn prompt_password(question: &str) -> Result<String> {
    loop {
        let password = rpassword::prompt_password(format!("{} {}: ", "?".green(), question))?;

        if !password.trim().is_empty() {
            return Ok(password.trim().into());
        }
    }
}

/// Lets the user pick a role by its number on the terminal.
#[derive(Default)]
pub struct ConsoleChooser {
    listed: bool,
}

impl RoleChooser for ConsoleChooser {
    fn choose(&mut self, candidates: &[RoleCandidate]) -> Result<usize> {
        if !self.listed {
            println!("\nPlease choose the role you would like to assume:");
            for (i, candidate) in candidates.iter().enumerate() {
                println!("[ {} ]: {}", i, candidate.role_arn);
            }
            println!();
            self.listed = true;
        }

        loop {
            let answer = prompt("Selection", None)
                .ok_or_else(|| Error::new(ErrorKind::Io, "No role selected"))?;

            match answer.parse::<usize>() {
                Ok(index) => return Ok(index),
                Err(_) => println!("{}", "Please enter the number of a role".red()),
            }
        }
    }

    fn reject(&mut self, error: &Error) {
        println!("{}", error.to_string().red());
    }
}

#[derive(Tabled)]
struct RoleRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Role")]
    role_arn: String,
    #[tabled(rename = "Profile")]
    profile: String,
}

pub fn roles_table(candidates: &[RoleCandidate], region: &str) -> String {
    let rows: Vec<RoleRow> = candidates
        .iter()
        .enumerate()
        .map(|(index, c)| RoleRow {
            index,
            role_arn: c.role_arn.clone(),
            profile: profile_key(region, &c.role_arn, &c.principal_arn)
                .unwrap_or_else(|e| format!("({})", e)),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn print_available_roles(roles: &[String]) {
    println!("\nThe following roles are available:\n");
    for role in roles {
        println!("\t{}", role.as_str().yellow());
    }
    println!();
}

pub fn print_summary(role: &ResolvedRole, credentials: &Credentials, export_file: &str) {
    let expiration = match credentials.expires_at() {
        Some(at) => at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S %z")
            .to_string(),
        None => credentials.expiration.clone(),
    };

    println!("\n{}\n", "-".repeat(80));
    println!(
        "Your new access key pair has been stored in your AWS configuration files under the profile:\n\n\t{}\n",
        role.profile_key.as_str().yellow()
    );
    println!(
        "It will expire at {}, after which you may safely run awsaml again to refresh it.\n",
        expiration.as_str().green()
    );
    println!("To use this credential call the AWS CLI with the --profile option, e.g.:\n");
    println!("\taws --profile {} ec2 describe-instances\n", role.profile_key);
    println!("Run the following to export these credentials into your current shell:\n");
    println!("\tsource {}", export_file);
    println!("\n{}\n", "-".repeat(80));
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_roles_table() {
        let candidates = vec![
            RoleCandidate {
                role_arn: "arn:aws:iam::111111111111:role/Admin".into(),
                principal_arn: "arn:aws:iam::111111111111:saml-provider/ADFS".into(),
            },
            RoleCandidate {
                role_arn: "broken".into(),
                principal_arn: "arn:aws:iam::222222222222:saml-provider/ADFS".into(),
            },
        ];

        let table = roles_table(&candidates, "eu-west-1");

        assert!(table.contains("arn:aws:iam::111111111111:role/Admin"));
        assert!(table.contains("eu-west-1-111111111111-Admin"));
        assert!(table.contains("Malformed ARN"));
    }
}
