//! Computer discovery over LDAP
//!
//! Each listing opens its own session: connect, simple bind, one subtree
//! search, unbind. The unbind is attempted whether or not the bind and
//! search succeeded.

use async_trait::async_trait;
use hostsync_core::{DirectorySource, SyncError, SyncResult};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry, SearchResult};
use tracing::{debug, info, instrument, warn};

use crate::config::LdapConfig;
use crate::error::DirectoryError;
use crate::Result;

const RC_SUCCESS: u32 = 0;
const RC_SIZE_LIMIT_EXCEEDED: u32 = 4;
const RC_INVALID_CREDENTIALS: u32 = 49;

/// LDAP-backed [`DirectorySource`]
#[derive(Debug, Clone)]
pub struct LdapDirectory {
    config: LdapConfig,
}

impl LdapDirectory {
    pub fn new(config: LdapConfig) -> Result<Self> {
        config.validate()?;
        Ok(LdapDirectory { config })
    }

    /// List the host name of every computer under the base DN.
    #[instrument(skip(self), fields(base_dn = %self.config.base_dn))]
    pub async fn list_computer_host_names(&self) -> Result<Vec<String>> {
        let mut ldap = self.connect().await?;
        let outcome = self.bind_and_search(&mut ldap).await;
        self.release(&mut ldap).await;

        let names = outcome?;
        info!(count = names.len(), "Directory computers listed");
        Ok(names)
    }

    /// Verify the server is reachable and accepts the configured bind.
    pub async fn check(&self) -> Result<()> {
        let mut ldap = self.connect().await?;
        let outcome = self.bind(&mut ldap).await;
        self.release(&mut ldap).await;
        outcome
    }

    async fn connect(&self) -> Result<Ldap> {
        debug!(url = %self.config.url, "Connecting to LDAP server");

        let settings = LdapConnSettings::new().set_starttls(self.config.starttls);
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.config.url)
            .await
            .map_err(|e| DirectoryError::Connect {
                url: self.config.url.clone(),
                message: e.to_string(),
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        Ok(ldap)
    }

    async fn bind(&self, ldap: &mut Ldap) -> Result<()> {
        debug!(bind_dn = %self.config.bind_dn, "Performing LDAP bind");
        let result = ldap
            .simple_bind(&self.config.bind_dn, &self.config.bind_password)
            .await?;

        match result.rc {
            RC_SUCCESS => Ok(()),
            RC_INVALID_CREDENTIALS => Err(DirectoryError::InvalidCredentials {
                bind_dn: self.config.bind_dn.clone(),
            }),
            rc => Err(DirectoryError::BindRejected {
                rc,
                text: result.text,
            }),
        }
    }

    async fn bind_and_search(&self, ldap: &mut Ldap) -> Result<Vec<String>> {
        self.bind(ldap).await?;

        let attribute = self.config.host_name_attribute.as_str();
        let SearchResult(entries, result) = ldap
            .search(
                &self.config.base_dn,
                Scope::Subtree,
                &self.config.filter,
                vec![attribute],
            )
            .await?;

        check_search_result(&self.config.base_dn, result.rc, result.text, entries.len())?;

        let total = entries.len();
        let names: Vec<String> = entries
            .into_iter()
            .map(SearchEntry::construct)
            .filter_map(|entry| host_name_of(&entry, attribute))
            .collect();
        if names.len() < total {
            debug!(
                skipped = total - names.len(),
                attribute = %attribute,
                "Skipped entries without a host name"
            );
        }
        Ok(names)
    }

    async fn release(&self, ldap: &mut Ldap) {
        if let Err(e) = ldap.unbind().await {
            warn!(error = %e, "Error during LDAP unbind");
        }
    }
}

/// Map a search result code to success or an error.
///
/// A size-limited listing is incomplete; acting on it would remove every
/// monitored host past the cut-off, so it fails the read.
fn check_search_result(base_dn: &str, rc: u32, text: String, returned: usize) -> Result<()> {
    match rc {
        RC_SUCCESS => Ok(()),
        RC_SIZE_LIMIT_EXCEEDED => {
            warn!(returned, "Server size limit exceeded, refusing a truncated listing");
            Err(DirectoryError::Truncated {
                base_dn: base_dn.to_string(),
                returned,
            })
        }
        rc => Err(DirectoryError::Search {
            base_dn: base_dn.to_string(),
            rc,
            text,
        }),
    }
}

/// First non-blank value of `attribute`, matched case-insensitively.
pub fn host_name_of(entry: &SearchEntry, attribute: &str) -> Option<String> {
    entry
        .attrs
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
        .and_then(|(_, values)| values.iter().map(|v| v.trim()).find(|v| !v.is_empty()))
        .map(str::to_string)
}

#[async_trait]
impl DirectorySource for LdapDirectory {
    async fn list_computer_host_names(&self) -> SyncResult<Vec<String>> {
        LdapDirectory::list_computer_host_names(self)
            .await
            .map_err(SyncError::from)
    }
}
