//! Coarse grouping of catalog categories into browsing domains
//!
//! Best effort: the first domain whose keyword appears in the lower-cased
//! category name wins, so names carrying several keywords land in the earliest.

/// Browsing domain for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Domain {
    /// Certification campaigns, entitlements, access requests
    Governance,
    /// Data privacy and consent
    PrivacyConsent,
    /// SAML, OIDC and token exchange
    Federation,
    /// Authentication factors
    Mfa,
    /// Access and password policies, API clients, sessions
    AccessPolicy,
    /// Users, groups, identity sources
    Identity,
    /// Events, reports, logs, certificates
    Operations,
    /// Tenant-wide configuration
    Configuration,
    /// Everything else
    Other,
}

const RULES: &[(Domain, &[&str])] = &[
    (Domain::Governance, &["certification", "entitlement", "access request"]),
    (Domain::PrivacyConsent, &["privacy", "consent"]),
    (
        Domain::Federation,
        &["saml", "oidc", "openid", "federation", "idp", "token exchange", "jwt exchange"],
    ),
    (
        Domain::Mfa,
        &[
            "otp",
            "fido",
            "factor",
            "authenticator",
            "mfa",
            "knowledge question",
            "qr code",
            "signature",
            "password authentication",
            "smartcard",
            "push",
        ],
    ),
    (Domain::AccessPolicy, &["policy", "access", "api client", "session"]),
    (
        Domain::Identity,
        &["user", "group", "identity", "attribute", "provisioning", "self care"],
    ),
    (
        Domain::Operations,
        &["event", "report", "log", "webhook", "threat", "certificate", "suppression", "agent bridge", "adapter"],
    ),
    (
        Domain::Configuration,
        &["configuration", "tenant", "theme", "template", "flow", "vault", "dictionary", "well-known", "device", "expiration"],
    ),
];

impl Domain {
    /// Classify a category by name
    #[must_use]
    pub fn classify(category: &str) -> Self {
        let name = category.to_lowercase();
        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| name.contains(k)))
            .map_or(Self::Other, |(domain, _)| *domain)
    }

    /// Key used in tool output
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Governance => "governance",
            Self::PrivacyConsent => "privacy_consent",
            Self::Federation => "federation",
            Self::Mfa => "mfa",
            Self::AccessPolicy => "access_policy",
            Self::Identity => "identity",
            Self::Operations => "operations",
            Self::Configuration => "configuration",
            Self::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_representative_categories() {
        let cases = [
            ("Users Management v2.0 (SCIM)", Domain::Identity),
            ("Identity Sources v2", Domain::Identity),
            ("FIDO2", Domain::Mfa),
            ("Email OTP 2.0", Domain::Mfa),
            ("SAML 2.0 Federations", Domain::Federation),
            ("Token Exchange", Domain::Federation),
            ("Access Policy Management v5.0", Domain::AccessPolicy),
            ("Data Privacy & Consent (Runtime)", Domain::PrivacyConsent),
            ("Certification Campaign Instances v2.0", Domain::Governance),
            ("Query Logs", Domain::Operations),
            ("Certificates", Domain::Operations),
            ("Customization - Themes", Domain::Configuration),
            ("Well-Known URIs", Domain::Configuration),
        ];
        for (name, expected) in cases {
            assert_eq!(Domain::classify(name), expected, "{name}");
        }
    }

    #[test]
    fn earlier_domain_wins_on_overlap() {
        // carries both "otp" and "configuration"
        assert_eq!(Domain::classify("Email OTP Configuration 2.0"), Domain::Mfa);
        // carries both "entitlement" and "access"
        assert_eq!(Domain::classify("Admin Entitlement Management"), Domain::Governance);
    }

    #[test]
    fn unknown_names_fall_back_to_other() {
        assert_eq!(Domain::classify("Something Entirely New"), Domain::Other);
        assert_eq!(Domain::Other.as_str(), "other");
    }
}
