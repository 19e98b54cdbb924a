use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use ini::{EscapePolicy, Ini};

use super::Credentials;
use crate::error::Result;
use crate::resolve::ResolvedRole;

pub const EXPORT_FILE: &str = "exportawsvars.sh";

/// The AWS CLI configuration directory, `~/.aws` unless configured otherwise.
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        ProfileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.join("config")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.dir.join("credentials")
    }

    pub fn export_file(&self) -> PathBuf {
        self.dir.join(EXPORT_FILE)
    }

    /// Writes the profile, its credentials and the shell export script.
    pub fn save(
        &self,
        role: &ResolvedRole,
        credentials: &Credentials,
        region: &str,
        output_format: &str,
    ) -> Result<()> {
        fs::create_dir_all(self.dir())?;

        self.save_profile(&role.profile_key, region, output_format)?;
        self.save_credentials(&role.profile_key, credentials)?;
        self.save_exports(credentials, region)?;

        Ok(())
    }

    /// Adds `[profile <key>]` to the config file. An existing section is left untouched.
    fn save_profile(&self, profile: &str, region: &str, output_format: &str) -> Result<()> {
        let filename = self.config_file();
        let mut config = load_or_create(&filename)?;
        let section = format!("profile {}", profile);

        if config.section(Some(section.as_str())).is_none() {
            debug!("save_profile.add_section={}", section);
            config
                .with_section(Some(section))
                .set("output", output_format)
                .set("region", region);
        }

        config.write_to_file_policy(&filename, EscapePolicy::Nothing)?;
        Ok(())
    }

    fn save_credentials(&self, profile: &str, credentials: &Credentials) -> Result<()> {
        let filename = self.credentials_file();
        let mut store = load_or_create(&filename)?;

        store
            .with_section(Some(profile))
            .set("aws_access_key_id", credentials.access_key_id.as_str())
            .set("aws_secret_access_key", credentials.secret_access_key.as_str())
            .set("aws_session_token", credentials.session_token.as_str())
            .set("aws_session_token_expiration", credentials.expiration.as_str());

        store.write_to_file_policy(&filename, EscapePolicy::Nothing)?;
        Ok(())
    }

    fn save_exports(&self, credentials: &Credentials, region: &str) -> Result<()> {
        let mut f = File::create(self.export_file())?;

        f.write_all(export_script(credentials, region).as_bytes())?;
        Ok(())
    }
}

fn load_or_create(filename: &Path) -> Result<Ini> {
    if !filename.exists() {
        trace!("load_or_create.create={}", filename.display());
        File::create(filename)?;
    }

    Ok(Ini::load_from_file_noescape(filename)?)
}

fn export_script(credentials: &Credentials, region: &str) -> String {
    let mut script = String::from("#!/bin/sh\n");

    for (name, value) in &[
        ("AWS_ACCESS_KEY_ID", credentials.access_key_id.as_str()),
        ("AWS_SECRET_ACCESS_KEY", credentials.secret_access_key.as_str()),
        ("AWS_SESSION_TOKEN", credentials.session_token.as_str()),
        ("AWS_DEFAULT_REGION", region),
        ("TF_VAR_ACCESS_KEY", credentials.access_key_id.as_str()),
        ("TF_VAR_SECRET_KEY", credentials.secret_access_key.as_str()),
    ] {
        script.push_str(&format!("export {}=\"{}\"\n", name, value));
    }

    script
}

#[cfg(test)]
mod test {
    use super::*;

    fn temp_store(name: &str) -> ProfileStore {
        let dir = std::env::temp_dir().join(format!(
            "awsaml-test-{}-{}",
            std::process::id(),
            name
        ));
        let _ = fs::remove_dir_all(&dir);

        ProfileStore::new(dir.join(".aws"))
    }

    fn role() -> ResolvedRole {
        ResolvedRole {
            role_arn: "arn:aws:iam::123456789012:role/MyRole".into(),
            principal_arn: "arn:aws:iam::123456789012:saml-provider/MyIdP".into(),
            profile_key: "eu-west-1-123456789012-MyRole".into(),
        }
    }

    fn credentials(key: &str) -> Credentials {
        Credentials {
            access_key_id: key.into(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY".into(),
            session_token: "FwoGZXIvYXdzEXAMPLE//////////wEaDEXAMPLETOKEN=".into(),
            expiration: "2026-10-19T09:14:02+00:00".into(),
        }
    }

    #[test]
    fn test_save_creates_all_files() {
        let store = temp_store("create");

        store
            .save(&role(), &credentials("ASIA1"), "eu-west-1", "json")
            .unwrap();

        let config = Ini::load_from_file_noescape(store.config_file()).unwrap();
        let profile = config
            .section(Some("profile eu-west-1-123456789012-MyRole"))
            .unwrap();
        assert_eq!(profile.get("region"), Some("eu-west-1"));
        assert_eq!(profile.get("output"), Some("json"));

        let stored = Ini::load_from_file_noescape(store.credentials_file()).unwrap();
        let section = stored.section(Some("eu-west-1-123456789012-MyRole")).unwrap();
        assert_eq!(section.get("aws_access_key_id"), Some("ASIA1"));
        assert_eq!(
            section.get("aws_session_token"),
            Some("FwoGZXIvYXdzEXAMPLE//////////wEaDEXAMPLETOKEN=")
        );
        assert_eq!(
            section.get("aws_session_token_expiration"),
            Some("2026-10-19T09:14:02+00:00")
        );

        let exports = fs::read_to_string(store.export_file()).unwrap();
        assert!(exports.starts_with("#!/bin/sh\n"));
        assert!(exports.contains("export AWS_ACCESS_KEY_ID=\"ASIA1\"\n"));
        assert!(exports.contains("export AWS_DEFAULT_REGION=\"eu-west-1\"\n"));
        assert!(exports.contains("export TF_VAR_SECRET_KEY=\"wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY\"\n"));
    }

    #[test]
    fn test_save_keeps_other_profiles_and_existing_profile_settings() {
        let store = temp_store("keep");
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(
            store.config_file(),
            "[default]\nregion = us-east-1\n\n[profile eu-west-1-123456789012-MyRole]\noutput = text\nregion = eu-west-1\n",
        )
        .unwrap();
        fs::write(
            store.credentials_file(),
            "[default]\naws_access_key_id = AKIADEFAULT\n",
        )
        .unwrap();

        store
            .save(&role(), &credentials("ASIA1"), "eu-west-1", "json")
            .unwrap();
        store
            .save(&role(), &credentials("ASIA2"), "eu-west-1", "json")
            .unwrap();

        let config = Ini::load_from_file_noescape(store.config_file()).unwrap();
        assert_eq!(config.get_from(Some("default"), "region"), Some("us-east-1"));
        assert_eq!(
            config.get_from(Some("profile eu-west-1-123456789012-MyRole"), "output"),
            Some("text")
        );

        let stored = Ini::load_from_file_noescape(store.credentials_file()).unwrap();
        assert_eq!(
            stored.get_from(Some("default"), "aws_access_key_id"),
            Some("AKIADEFAULT")
        );
        assert_eq!(
            stored.get_from(Some("eu-west-1-123456789012-MyRole"), "aws_access_key_id"),
            Some("ASIA2")
        );
    }
}
