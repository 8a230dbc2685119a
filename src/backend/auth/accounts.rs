/**
 * Account Model
 *
 * This module defines the identity root of the subsystem: the `Account`
 * with its role state, optional password hash (federation-only accounts
 * have none), linked federated-provider identities, and role-specific
 * profile data.
 *
 * # Lifecycle
 *
 * An account is created either on password registration (role assigned
 * immediately) or by the registration completion flow consuming a pending
 * federation ticket. An account with role `unassigned` exists only
 * transiently between a federation callback and the completion submission;
 * it is never allowed to hold a live session and is never persisted by
 * this subsystem.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Application role of an account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// No role selected yet. Transient; never holds a session.
    Unassigned,
    /// Junior developer looking for scoped projects
    Junior,
    /// Company posting scoped projects
    Company,
    /// Platform administrator
    Admin,
}

impl Role {
    /// Roles a user may select for themselves during registration
    pub fn assignable(&self) -> bool {
        matches!(self, Role::Junior | Role::Company)
    }

    /// Wire/storage name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Unassigned => "unassigned",
            Role::Junior => "junior",
            Role::Company => "company",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unassigned" => Ok(Role::Unassigned),
            "junior" => Ok(Role::Junior),
            "company" => Ok(Role::Company),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// A linked federated-provider identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderLink {
    /// Provider name (e.g. "github", "google")
    pub provider: String,
    /// Provider-scoped subject id
    pub subject: String,
}

/// Role-specific data for junior developers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JuniorProfile {
    /// Self-assessed experience level (e.g. "entry", "intermediate")
    pub experience_level: String,
    /// Skills the developer offers
    pub skills: Vec<String>,
    /// Optional portfolio URL
    pub portfolio_url: Option<String>,
}

/// Role-specific data for companies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanyProfile {
    /// Legal or trading name
    pub company_name: String,
    /// Industry sector
    pub industry: String,
    /// Optional company website
    pub website: Option<String>,
}

/// Account representing one identity in the marketplace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique account ID (UUID)
    pub id: Uuid,
    /// Email address (unique, matched case-insensitively)
    pub email: String,
    /// Hashed password (bcrypt); `None` for federation-only accounts
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    /// Current role
    pub role: Role,
    /// Display name (from federation profile or registration)
    pub display_name: Option<String>,
    /// Avatar URL (from federation profile)
    pub avatar_url: Option<String>,
    /// Linked federated-provider identities
    pub provider_links: Vec<ProviderLink>,
    /// Junior role data; set iff role is `Junior`
    pub junior_profile: Option<JuniorProfile>,
    /// Company role data; set iff role is `Company`
    pub company_profile: Option<CompanyProfile>,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with no provider links or profile data
    ///
    /// Email is normalized to lowercase so uniqueness is case-insensitive.
    pub fn new(email: impl Into<String>, password_hash: Option<String>, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into().to_lowercase(),
            password_hash,
            role,
            display_name: None,
            avatar_url: None,
            provider_links: Vec::new(),
            junior_profile: None,
            company_profile: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this account already carries the given provider identity
    pub fn has_provider(&self, provider: &str, subject: &str) -> bool {
        self.provider_links
            .iter()
            .any(|link| link.provider == provider && link.subject == subject)
    }

    /// Link a provider identity. Idempotent.
    pub fn link_provider(&mut self, provider: impl Into<String>, subject: impl Into<String>) {
        let provider = provider.into();
        let subject = subject.into();
        if !self.has_provider(&provider, &subject) {
            self.provider_links.push(ProviderLink { provider, subject });
            self.updated_at = Utc::now();
        }
    }
}
