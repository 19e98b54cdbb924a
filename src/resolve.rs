use crate::error::{Error, ErrorKind, Result};
use crate::saml::ASSERTION_NS;

pub const ROLE_ATTRIBUTE: &str = "https://aws.amazon.com/SAML/Attributes/Role";

/// Only principal (identity provider) ARNs carry this marker.
const PRINCIPAL_MARKER: &str = "saml-provider";

#[derive(Debug, Clone, PartialEq)]
pub struct RoleCandidate {
    pub role_arn: String,
    pub principal_arn: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRole {
    pub role_arn: String,
    pub principal_arn: String,
    pub profile_key: String,
}

impl RoleCandidate {
    /// Parses a `role,principal` attribute value. Identity providers that
    /// emit `principal,role` are detected by the principal marker and swapped.
    pub fn parse(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.trim().split(',').map(str::trim).collect();
        let (first, second) = match fields[..] {
            [a, b] if !a.is_empty() && !b.is_empty() => (a, b),
            _ => {
                return Err(Error::malformed_assertion(&format!(
                    "role attribute value {:?} is not a comma separated pair",
                    value.trim()
                )))
            }
        };

        if first.contains(PRINCIPAL_MARKER) {
            trace!("role pair is reversed, swapping");
            return Ok(RoleCandidate {
                role_arn: second.into(),
                principal_arn: first.into(),
            });
        }

        Ok(RoleCandidate {
            role_arn: first.into(),
            principal_arn: second.into(),
        })
    }

    pub fn resolve(self, region: &str) -> Result<ResolvedRole> {
        let profile_key = profile_key(region, &self.role_arn, &self.principal_arn)?;

        Ok(ResolvedRole {
            role_arn: self.role_arn,
            principal_arn: self.principal_arn,
            profile_key,
        })
    }
}

/// Collects every AWS role pair of the assertion, in document order.
pub fn extract_candidates(doc: &roxmltree::Document) -> Result<Vec<RoleCandidate>> {
    doc.descendants()
        .filter(|n| {
            n.has_tag_name((ASSERTION_NS, "Attribute")) && n.attribute("Name") == Some(ROLE_ATTRIBUTE)
        })
        .flat_map(|attribute| {
            attribute
                .descendants()
                .filter(|n| n.has_tag_name((ASSERTION_NS, "AttributeValue")))
        })
        .map(|value| RoleCandidate::parse(value.text().unwrap_or_default()))
        .collect()
}

/// Picks one candidate out of several. Implemented by the terminal prompt and,
/// for tests or scripting, by any `FnMut(&[RoleCandidate]) -> Result<usize>`.
pub trait RoleChooser {
    fn choose(&mut self, candidates: &[RoleCandidate]) -> Result<usize>;

    /// Called when the last answer of `choose` was out of range, before asking again.
    fn reject(&mut self, _error: &Error) {}
}

impl<F> RoleChooser for F
where
    F: FnMut(&[RoleCandidate]) -> Result<usize>,
{
    fn choose(&mut self, candidates: &[RoleCandidate]) -> Result<usize> {
        self(candidates)
    }
}

/// Resolves exactly one role out of the candidates of an assertion.
pub fn resolve(
    candidates: Vec<RoleCandidate>,
    desired_role_arn: Option<&str>,
    region: &str,
    chooser: Option<&mut dyn RoleChooser>,
) -> Result<ResolvedRole> {
    let mut candidates = candidates;

    if candidates.is_empty() {
        return Err(Error::new(
            ErrorKind::NoRolesAvailable,
            "The SAML assertion does not grant any AWS role",
        ));
    }

    if candidates.len() == 1 {
        debug!("resolve.single_candidate");
        return candidates.remove(0).resolve(region);
    }

    let index = match desired_role_arn {
        Some(desired) => {
            debug!("resolve.desired_role={}", desired);
            match candidates.iter().position(|c| c.role_arn == desired) {
                Some(i) => i,
                None => return Err(Error::role_not_found(desired, role_arns(&candidates))),
            }
        }
        None => {
            let chooser = chooser.ok_or_else(|| {
                Error::new(
                    ErrorKind::SelectionRequired {
                        available: role_arns(&candidates),
                    },
                    "Several roles are available, but no role was specified and no prompt is possible",
                )
            })?;

            choose(chooser, &candidates)?
        }
    };

    candidates.swap_remove(index).resolve(region)
}

fn choose(chooser: &mut dyn RoleChooser, candidates: &[RoleCandidate]) -> Result<usize> {
    loop {
        let index = chooser.choose(candidates)?;

        if index < candidates.len() {
            return Ok(index);
        }

        debug!("choose.out_of_range index={}", index);
        chooser.reject(&Error::invalid_selection(index, candidates.len()));
    }
}

fn role_arns(candidates: &[RoleCandidate]) -> Vec<String> {
    candidates.iter().map(|c| c.role_arn.clone()).collect()
}

/// `<region>-<account of the principal>-<role name>`
pub fn profile_key(region: &str, role_arn: &str, principal_arn: &str) -> Result<String> {
    let account = arn_fields(principal_arn)?[4];
    if account.is_empty() {
        return Err(Error::malformed_arn(principal_arn, "the account field is empty"));
    }

    let resource = arn_fields(role_arn)?[5];
    let role_name = match resource.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => name,
        _ => return Err(Error::malformed_arn(role_arn, "no role name after the last '/'")),
    };

    Ok(format!("{}-{}-{}", region, account, role_name))
}

/// Splits `arn:partition:service:region:account:resource`.
fn arn_fields(arn: &str) -> Result<Vec<&str>> {
    let fields: Vec<&str> = arn.splitn(6, ':').collect();

    if fields.len() != 6 || fields[0] != "arn" {
        return Err(Error::malformed_arn(
            arn,
            "expected arn:partition:service:region:account:resource",
        ));
    }

    Ok(fields)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::saml::test::{response_page, MULTIPLE_ROLES_XML, REVERSED_ROLE_XML};
    use crate::saml::{extract, SAMLAssertion};

    fn candidate(account: &str, role: &str) -> RoleCandidate {
        RoleCandidate {
            role_arn: format!("arn:aws:iam::{}:role/{}", account, role),
            principal_arn: format!("arn:aws:iam::{}:saml-provider/ADFS", account),
        }
    }

    fn three_candidates() -> Vec<RoleCandidate> {
        vec![
            candidate("111111111111", "Admin"),
            candidate("222222222222", "ReadOnly"),
            candidate("333333333333", "Developer"),
        ]
    }

    fn candidates_of(xml: &str) -> Vec<RoleCandidate> {
        let assertion: SAMLAssertion = extract(&response_page(xml)).unwrap();
        extract_candidates(&assertion.document().unwrap()).unwrap()
    }

    struct ScriptedChooser {
        answers: Vec<usize>,
        rejected: Vec<ErrorKind>,
        shown: usize,
    }

    impl RoleChooser for ScriptedChooser {
        fn choose(&mut self, candidates: &[RoleCandidate]) -> Result<usize> {
            self.shown = candidates.len();
            Ok(self.answers.remove(0))
        }

        fn reject(&mut self, error: &Error) {
            self.rejected.push(match error.kind {
                ErrorKind::InvalidSelection { index, len } => ErrorKind::InvalidSelection { index, len },
                _ => ErrorKind::Io,
            });
        }
    }

    #[test]
    fn test_parse_ordered_pair() {
        let c = RoleCandidate::parse(
            "arn:aws:iam::123456789012:role/MyRole,arn:aws:iam::123456789012:saml-provider/MyIdP",
        )
        .unwrap();

        assert_eq!(c.role_arn, "arn:aws:iam::123456789012:role/MyRole");
        assert_eq!(c.principal_arn, "arn:aws:iam::123456789012:saml-provider/MyIdP");
    }

    #[test]
    fn test_parse_reversed_pair() {
        let c = RoleCandidate::parse(
            "arn:aws:iam::123456789012:saml-provider/MyIdP,arn:aws:iam::123456789012:role/MyRole",
        )
        .unwrap();

        assert_eq!(c.role_arn, "arn:aws:iam::123456789012:role/MyRole");
        assert_eq!(c.principal_arn, "arn:aws:iam::123456789012:saml-provider/MyIdP");
    }

    #[test]
    fn test_parse_not_a_pair() {
        assert_eq!(
            RoleCandidate::parse("arn:aws:iam::123456789012:role/MyRole").unwrap_err().kind,
            ErrorKind::MalformedAssertion
        );
        assert_eq!(
            RoleCandidate::parse(",arn:aws:iam::123456789012:role/MyRole").unwrap_err().kind,
            ErrorKind::MalformedAssertion
        );
    }

    #[test]
    fn test_parse_rejects_extra_fields() {
        for value in &[
            "arn:aws:iam::1:saml-provider/B,arn:aws:iam::1:role/A,junk",
            "arn:aws:iam::1:role/A,arn:aws:iam::1:saml-provider/B,junk",
            "arn:aws:iam::1:role/A,arn:aws:iam::1:saml-provider/B,",
        ] {
            assert_eq!(
                RoleCandidate::parse(value).unwrap_err().kind,
                ErrorKind::MalformedAssertion,
                "{}",
                value
            );
        }
    }

    #[test]
    fn test_extract_candidates_single_reversed_role() {
        let candidates = candidates_of(REVERSED_ROLE_XML);

        assert_eq!(
            candidates,
            vec![RoleCandidate {
                role_arn: "arn:aws:iam::123456789012:role/MyRole".into(),
                principal_arn: "arn:aws:iam::123456789012:saml-provider/MyIdP".into(),
            }]
        );
    }

    #[test]
    fn test_extract_candidates_mixed_order_keeps_position() {
        let candidates = candidates_of(MULTIPLE_ROLES_XML);

        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].role_arn, "arn:aws:iam::111111111111:role/ADFS-Admin");
        assert_eq!(candidates[1].role_arn, "arn:aws:iam::222222222222:role/ADFS-ReadOnly");
        assert_eq!(
            candidates[1].principal_arn,
            "arn:aws:iam::222222222222:saml-provider/ADFS"
        );
        assert_eq!(
            candidates[2].role_arn,
            "arn:aws:iam::333333333333:role/team/ADFS-Developer"
        );
    }

    #[test]
    fn test_extract_candidates_ignores_other_namespaces() {
        let xml = r#"<Response>
            <Attribute Name="https://aws.amazon.com/SAML/Attributes/Role">
                <AttributeValue>arn:aws:iam::1:role/a,arn:aws:iam::1:saml-provider/b</AttributeValue>
            </Attribute>
        </Response>"#;

        assert!(candidates_of(xml).is_empty());
    }

    #[test]
    fn test_resolve_no_candidates() {
        let err = resolve(vec![], Some("arn:aws:iam::1:role/a"), "eu-west-1", None).unwrap_err();

        assert_eq!(err.kind, ErrorKind::NoRolesAvailable);
    }

    #[test]
    fn test_resolve_single_candidate_ignores_desired_role_and_chooser() {
        let mut chooser = |_: &[RoleCandidate]| -> Result<usize> { panic!("chooser must not be asked") };

        let resolved = resolve(
            vec![candidate("123456789012", "MyRole")],
            Some("arn:aws:iam::999999999999:role/Other"),
            "eu-west-1",
            Some(&mut chooser),
        )
        .unwrap();

        assert_eq!(resolved.role_arn, "arn:aws:iam::123456789012:role/MyRole");
        assert_eq!(resolved.profile_key, "eu-west-1-123456789012-MyRole");
    }

    #[test]
    fn test_resolve_desired_role() {
        let resolved = resolve(
            three_candidates(),
            Some("arn:aws:iam::222222222222:role/ReadOnly"),
            "us-east-1",
            None,
        )
        .unwrap();

        assert_eq!(resolved.principal_arn, "arn:aws:iam::222222222222:saml-provider/ADFS");
        assert_eq!(resolved.profile_key, "us-east-1-222222222222-ReadOnly");
    }

    #[test]
    fn test_resolve_desired_role_not_found() {
        let mut chooser = |_: &[RoleCandidate]| -> Result<usize> { Ok(0) };

        let err = resolve(
            three_candidates(),
            Some("arn:aws:iam::222222222222:role/readonly"),
            "eu-west-1",
            Some(&mut chooser),
        )
        .unwrap_err();

        assert_eq!(
            err.kind,
            ErrorKind::RoleNotFound {
                requested: "arn:aws:iam::222222222222:role/readonly".into(),
                available: vec![
                    "arn:aws:iam::111111111111:role/Admin".into(),
                    "arn:aws:iam::222222222222:role/ReadOnly".into(),
                    "arn:aws:iam::333333333333:role/Developer".into(),
                ],
            }
        );
    }

    #[test]
    fn test_resolve_chooser_is_asked_again_after_invalid_index() {
        let mut chooser = ScriptedChooser {
            answers: vec![3, 2],
            rejected: vec![],
            shown: 0,
        };

        let resolved = resolve(three_candidates(), None, "eu-west-1", Some(&mut chooser)).unwrap();

        assert_eq!(resolved.role_arn, "arn:aws:iam::333333333333:role/Developer");
        assert_eq!(chooser.shown, 3);
        assert_eq!(
            chooser.rejected,
            vec![ErrorKind::InvalidSelection { index: 3, len: 3 }]
        );
    }

    #[test]
    fn test_resolve_chooser_closure() {
        let mut chooser = |c: &[RoleCandidate]| -> Result<usize> { Ok(c.len() - 3) };

        let resolved = resolve(three_candidates(), None, "eu-west-1", Some(&mut chooser)).unwrap();

        assert_eq!(resolved.profile_key, "eu-west-1-111111111111-Admin");
    }

    #[test]
    fn test_resolve_chooser_error_propagates() {
        let mut chooser = |_: &[RoleCandidate]| -> Result<usize> {
            Err(Error::new(ErrorKind::Io, "stdin closed"))
        };

        let err = resolve(three_candidates(), None, "eu-west-1", Some(&mut chooser)).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Io);
    }

    #[test]
    fn test_resolve_without_chooser() {
        let err = resolve(three_candidates(), None, "eu-west-1", None).unwrap_err();

        assert_eq!(err.available_roles().map(|r| r.len()), Some(3));
    }

    #[test]
    fn test_profile_key() {
        assert_eq!(
            profile_key(
                "eu-west-1",
                "arn:aws:iam::123456789012:role/MyRole",
                "arn:aws:iam::123456789012:saml-provider/MyIdP"
            )
            .unwrap(),
            "eu-west-1-123456789012-MyRole"
        );
    }

    #[test]
    fn test_profile_key_uses_last_path_segment() {
        assert_eq!(
            profile_key(
                "eu-central-1",
                "arn:aws:iam::333333333333:role/team/ADFS-Developer",
                "arn:aws:iam::333333333333:saml-provider/ADFS"
            )
            .unwrap(),
            "eu-central-1-333333333333-ADFS-Developer"
        );
    }

    #[test]
    fn test_profile_key_malformed_arns() {
        let principal = "arn:aws:iam::123456789012:saml-provider/MyIdP";

        for role in &[
            "MyRole",
            "arn:aws:iam::123456789012:role",
            "arn:aws:iam::123456789012:role/",
        ] {
            assert_eq!(
                profile_key("eu-west-1", role, principal).unwrap_err().kind,
                ErrorKind::MalformedArn,
                "{}",
                role
            );
        }

        assert_eq!(
            profile_key("eu-west-1", "arn:aws:iam::123456789012:role/MyRole", "arn:aws:iam:::saml-provider/MyIdP")
                .unwrap_err()
                .kind,
            ErrorKind::MalformedArn
        );
    }
}
