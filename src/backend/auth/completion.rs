/**
 * Registration Completion Flow
 *
 * This module finalizes identities that arrived without a role: it consumes
 * a pending federation ticket together with role-specific fields, creates
 * the account with role and profile set in one step, and immediately issues
 * a token pair.
 *
 * # Validation Order
 *
 * Role and role-field validation run before the ticket is consumed, so a
 * rejected submission leaves the ticket redeemable and causes no account
 * mutation. Password signup reuses the same role-field validation.
 */

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::auth::accounts::{Account, CompanyProfile, JuniorProfile, Role};
use crate::backend::auth::federation::TicketStore;
use crate::backend::auth::tokens::{TokenPair, TokenService};
use crate::backend::error::AuthError;
use crate::backend::store::Store;

/// Role-specific fields supplied by the caller
///
/// Junior roles require `experience_level` and `skills`; company roles
/// require `company_name` and `industry`. The remaining fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleFields {
    pub experience_level: Option<String>,
    pub skills: Option<Vec<String>>,
    pub portfolio_url: Option<String>,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
}

/// Validate a requested role string into an assignable `Role`
pub fn parse_assignable_role(role: &str) -> Result<Role, AuthError> {
    match role.parse::<Role>() {
        Ok(parsed) if parsed.assignable() => Ok(parsed),
        _ => Err(AuthError::InvalidRole(role.to_string())),
    }
}

/// Build the role profile from supplied fields
///
/// Fails with `MissingRoleFields` naming the first absent required field.
pub fn build_profile(
    role: Role,
    fields: &RoleFields,
) -> Result<(Option<JuniorProfile>, Option<CompanyProfile>), AuthError> {
    match role {
        Role::Junior => {
            let experience_level = fields
                .experience_level
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or(AuthError::MissingRoleFields("experience_level"))?;
            let skills = fields
                .skills
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or(AuthError::MissingRoleFields("skills"))?;
            Ok((
                Some(JuniorProfile {
                    experience_level,
                    skills,
                    portfolio_url: fields.portfolio_url.clone(),
                }),
                None,
            ))
        }
        Role::Company => {
            let company_name = fields
                .company_name
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or(AuthError::MissingRoleFields("company_name"))?;
            let industry = fields
                .industry
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or(AuthError::MissingRoleFields("industry"))?;
            Ok((
                None,
                Some(CompanyProfile {
                    company_name,
                    industry,
                    website: fields.website.clone(),
                }),
            ))
        }
        Role::Unassigned | Role::Admin => Err(AuthError::InvalidRole(role.to_string())),
    }
}

/// Finalizes pending federated identities into fully authorized accounts
#[derive(Clone)]
pub struct CompletionFlow {
    store: Arc<dyn Store>,
    tokens: TokenService,
    tickets: TicketStore,
}

impl CompletionFlow {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, tickets: TicketStore) -> Self {
        Self { store, tokens, tickets }
    }

    /// Consume a pending ticket and create the completed account
    ///
    /// # Errors
    ///
    /// * `InvalidRole` - role absent or not one of junior/company
    /// * `MissingRoleFields` - a required role field is absent (named)
    /// * `InvalidTicket` - ticket unknown, expired, or already consumed
    pub async fn complete(
        &self,
        ticket_id: Uuid,
        role: Role,
        fields: &RoleFields,
    ) -> Result<(Account, TokenPair), AuthError> {
        if !role.assignable() {
            return Err(AuthError::InvalidRole(role.to_string()));
        }
        let (junior_profile, company_profile) = build_profile(role, fields)?;

        // Validation passed; consuming the ticket is now safe.
        let ticket = self.tickets.consume(ticket_id).ok_or(AuthError::InvalidTicket)?;

        // An account may have appeared for this email since the callback
        // (e.g. a parallel password signup). Link the provider and leave
        // the established role untouched.
        if let Some(mut existing) = self.store.find_account_by_email(&ticket.profile.email).await? {
            existing.link_provider(ticket.profile.provider, ticket.profile.subject);
            let existing = self.store.update_account(existing).await?;
            let pair = self.tokens.issue(existing.id, existing.role).await?;
            return Ok((existing, pair));
        }

        let mut account = Account::new(ticket.profile.email, None, role);
        account.display_name = Some(ticket.profile.display_name);
        account.avatar_url = ticket.profile.avatar_url;
        account.junior_profile = junior_profile;
        account.company_profile = company_profile;
        account.link_provider(ticket.profile.provider, ticket.profile.subject);

        let account = self.store.create_account(account).await?;
        tracing::info!("Completed registration for account {} as {}", account.id, role);

        let pair = self.tokens.issue(account.id, account.role).await?;
        Ok((account, pair))
    }
}
