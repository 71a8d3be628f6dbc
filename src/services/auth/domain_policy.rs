//! Email-domain allow-list: the single authorization decision for sign-in.

/// Domains allowed when `ALLOWED_EMAIL_DOMAINS` is not configured.
pub const DEFAULT_ALLOWED_DOMAINS: [&str; 3] = ["iitkgp.ac.in", "kgpian.iitkgp.ac.in", "gmail.com"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainPolicy {
    allowed_domains: Vec<String>,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_DOMAINS)
    }
}

impl DomainPolicy {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_domains: domains.into_iter().map(Into::into).collect(),
        }
    }

    /// `true` iff `email` ends with `@<domain>` for one of the allowed domains.
    ///
    /// Case-sensitive, no normalisation. A subdomain does not match its parent:
    /// `x@kgpian.iitkgp.ac.in` only passes if `kgpian.iitkgp.ac.in` is listed.
    pub fn is_allowed(&self, email: Option<&str>) -> bool {
        let Some(email) = email else {
            return false;
        };

        self.allowed_domains.iter().any(|domain| {
            email
                .strip_suffix(domain.as_str())
                .is_some_and(|rest| rest.ends_with('@'))
        })
    }
}
