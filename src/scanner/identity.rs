//! Author Identity Resolution
//!
//! Maps commit author emails to organization member usernames. Direct
//! resolution works by substring containment against the membership
//! list; bot-authored noreply commits fall back to the alias table and
//! the commit message, which can produce zero or several candidates.

use std::collections::{BTreeMap, HashSet};

/// Marker present in provider noreply addresses used by service bots
const NOREPLY_MARKER: &str = "users.noreply.github.com";

/// Resolves author emails to usernames, learning as it goes.
///
/// The alias table is seeded from configuration and extended with
/// memoized member matches, so repeated lookups for the same email are
/// map hits.
#[derive(Debug)]
pub struct IdentityResolver {
    members: Vec<String>,
    aliases: BTreeMap<String, String>,
}

impl IdentityResolver {
    pub fn new(members: Vec<String>, aliases: BTreeMap<String, String>) -> Self {
        Self { members, aliases }
    }

    /// Resolve one email to a username; empty string when unknown.
    pub fn resolve(&mut self, email: &str) -> String {
        if let Some(username) = self.aliases.get(email) {
            return username.clone();
        }
        let matched = self
            .members
            .iter()
            .find(|member| !member.is_empty() && email.contains(member.as_str()))
            .cloned();
        if let Some(member) = matched {
            self.aliases.insert(email.to_string(), member.clone());
            return member;
        }
        String::new()
    }

    /// Candidate usernames for a commit authored by `email`.
    ///
    /// A direct resolution yields exactly one candidate. An unresolved
    /// human email yields a single empty candidate so the commit is
    /// still retained, just unattributed. An unresolved bot (noreply)
    /// email is matched against the alias table - alias key contained
    /// in the lowercased message, or username contained in the email -
    /// and may yield zero or several candidates.
    pub fn candidates(&mut self, email: &str, message: &str) -> Vec<String> {
        let resolved = self.resolve(email);
        if !resolved.is_empty() {
            return vec![resolved];
        }
        if !email.contains(NOREPLY_MARKER) {
            return vec![String::new()];
        }

        let message = message.to_lowercase();
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for (alias, username) in &self.aliases {
            if message.contains(alias.as_str()) || email.contains(username.as_str()) {
                if seen.insert(username.clone()) {
                    candidates.push(username.clone());
                }
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(alias, username)| (alias.to_string(), username.to_string()))
            .collect()
    }

    #[test]
    fn alias_table_hit_wins() {
        let mut resolver = IdentityResolver::new(
            vec!["casey".to_string()],
            aliases(&[("casey@corp.example", "casey-gh")]),
        );
        assert_eq!(resolver.resolve("casey@corp.example"), "casey-gh");
    }

    #[test]
    fn member_substring_match_is_memoized() {
        let mut resolver = IdentityResolver::new(vec!["devon".to_string()], BTreeMap::new());
        assert_eq!(resolver.resolve("devon@corp.example"), "devon");
        assert_eq!(
            resolver.aliases.get("devon@corp.example").map(String::as_str),
            Some("devon")
        );
    }

    #[test]
    fn unknown_email_is_unresolved() {
        let mut resolver = IdentityResolver::new(vec!["devon".to_string()], BTreeMap::new());
        assert_eq!(resolver.resolve("stranger@elsewhere.example"), "");
    }

    #[test]
    fn unknown_human_email_yields_single_empty_candidate() {
        let mut resolver = IdentityResolver::new(Vec::new(), BTreeMap::new());
        assert_eq!(
            resolver.candidates("stranger@elsewhere.example", "update docs"),
            vec![String::new()]
        );
    }

    #[test]
    fn bot_email_matches_alias_key_in_message() {
        let mut resolver =
            IdentityResolver::new(Vec::new(), aliases(&[("carla", "carla-gh")]));
        let candidates = resolver.candidates(
            "12345+automation[bot]@users.noreply.github.com",
            "Carla: bump dependency versions",
        );
        assert_eq!(candidates, vec!["carla-gh".to_string()]);
    }

    #[test]
    fn bot_email_matches_username_in_address() {
        let mut resolver =
            IdentityResolver::new(Vec::new(), aliases(&[("ops@corp.example", "renovate")]));
        let candidates = resolver.candidates(
            "29139614+renovate[bot]@users.noreply.github.com",
            "chore(deps): update lockfile",
        );
        assert_eq!(candidates, vec!["renovate".to_string()]);
    }

    #[test]
    fn bot_email_with_no_match_yields_no_candidates() {
        let mut resolver =
            IdentityResolver::new(Vec::new(), aliases(&[("casey@corp.example", "casey")]));
        let candidates = resolver.candidates(
            "99999+mystery[bot]@users.noreply.github.com",
            "automated formatting pass",
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn bot_fan_out_yields_every_match_once() {
        let mut resolver = IdentityResolver::new(
            Vec::new(),
            aliases(&[("alpha@corp, example", "amal"), ("beta", "bo")]),
        );
        let candidates = resolver.candidates(
            "777+tool[bot]@users.noreply.github.com",
            "alpha@corp, example and beta paired on this",
        );
        assert_eq!(candidates, vec!["amal".to_string(), "bo".to_string()]);
    }
}
