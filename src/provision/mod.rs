//! Repository provisioning.
//!
//! Creating a chatbot touches two systems with no shared transaction: the
//! GitHub repository is created first, then the local record. The provisioner
//! runs that as an explicit saga — if the local write fails after the remote
//! repository exists, it issues a compensating delete, and only when the
//! compensation itself fails does an inconsistency survive (reported and
//! logged, never swallowed).

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::github::{HostError, RepoHost};
use crate::secrets::TokenCipher;
use crate::store::Store;
use crate::types::{Chatbot, Identity};

/// Derives the repository name from a user-supplied chatbot name:
/// lower-cased, whitespace runs collapsed to single hyphens, everything
/// outside `[a-z0-9-]` stripped. Pure, so it can be asserted without I/O.
#[must_use]
pub fn slugify(desired_name: &str) -> String {
    desired_name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

pub struct Provisioner {
    store: Arc<dyn Store>,
    host: Arc<dyn RepoHost>,
    cipher: TokenCipher,
    in_flight: Mutex<HashSet<String>>,
}

impl Provisioner {
    pub fn new(store: Arc<dyn Store>, host: Arc<dyn RepoHost>, cipher: TokenCipher) -> Self {
        Self {
            store,
            host,
            cipher,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Provisions a chatbot repository from a template.
    ///
    /// Walks Validating → CreatingRemote → PersistingLocal; the remote call
    /// always precedes the local write, and the returned record implies both
    /// succeeded. Submissions are single-flight per identity; a concurrent
    /// call for the same identity gets a conflict without touching GitHub.
    pub async fn provision(
        &self,
        identity: &Identity,
        template_id: &str,
        desired_name: &str,
    ) -> Result<Chatbot> {
        let _guard = InFlightGuard::acquire(&self.in_flight, &identity.id)?;

        // Validating
        let template = self
            .store
            .get_template(template_id)?
            .ok_or(Error::NotFound)?;
        if !template.active {
            return Err(Error::TemplateInactive);
        }

        let repo_name = slugify(desired_name);
        if repo_name.is_empty() {
            return Err(Error::BadRequest(
                "chatbot name must contain at least one alphanumeric character".to_string(),
            ));
        }

        // The remote create has no idempotency key, so catch resubmissions
        // of an already-provisioned name before any side effect.
        if self
            .store
            .get_chatbot_by_repo_name(&identity.id, &repo_name)?
            .is_some()
        {
            return Err(Error::NameConflict(repo_name));
        }

        let access_token = self.cipher.open(&identity.sealed_token)?;

        // CreatingRemote: under the caller's own account, with their token.
        let description = format!("Chatbot {}", desired_name.trim());
        let created = match self
            .host
            .create_repo(&access_token, &repo_name, &description)
            .await
        {
            Ok(created) => created,
            // The caller resubmits with a different name; no suffixing.
            Err(HostError::NameConflict) => return Err(Error::NameConflict(repo_name)),
            Err(e) => return Err(e.into()),
        };

        // PersistingLocal
        let chatbot = Chatbot {
            id: Uuid::new_v4().to_string(),
            identity_id: identity.id.clone(),
            template_id: template.id,
            repo_name: created.name.clone(),
            repo_url: created.html_url.clone(),
            display_name: desired_name.trim().to_string(),
            created_at: Utc::now(),
        };

        let Err(persist_err) = self.store.create_chatbot(&chatbot) else {
            tracing::info!(
                identity = %identity.id,
                repo = %chatbot.repo_name,
                url = %chatbot.repo_url,
                "chatbot provisioned"
            );
            return Ok(chatbot);
        };

        // CompensatingDelete: the remote repository exists but the record
        // does not. Undo the remote side rather than leave an orphan.
        tracing::warn!(
            identity = %identity.id,
            repo = %created.name,
            error = %persist_err,
            "local persistence failed after remote creation, compensating"
        );

        match self
            .host
            .delete_repo(&access_token, &identity.login, &created.name)
            .await
        {
            Ok(()) => Err(Error::PartialFailure {
                compensation_failed: false,
                remote_url: None,
            }),
            Err(delete_err) => {
                // The one state this workflow cannot repair. Must reach the
                // operator, not just the caller.
                tracing::error!(
                    identity = %identity.id,
                    remote_url = %created.html_url,
                    error = %delete_err,
                    "compensating delete failed, remote repository is orphaned"
                );
                Err(Error::PartialFailure {
                    compensation_failed: true,
                    remote_url: Some(created.html_url),
                })
            }
        }
    }
}

/// Marks an identity as having a provisioning call in flight; removed on
/// drop so every exit path releases the slot.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    identity_id: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(set: &'a Mutex<HashSet<String>>, identity_id: &str) -> Result<Self> {
        let mut in_flight = set.lock().unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(identity_id.to_string()) {
            return Err(Error::Conflict(
                "a provisioning request for this account is already in progress".to_string(),
            ));
        }
        Ok(Self {
            set,
            identity_id: identity_id.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.set.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.remove(&self.identity_id);
    }
}
