//! Hands the generated autoprov configuration back to the telephony user.

use crate::{Command, Executor, ExecutorId, Result};
use async_trait::async_trait;
use log::{info, warn};
use nix::unistd::{Gid, Uid, User};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use sysconf_protocol::RequestOptions;

pub const CHOWN_AUTOPROV_EXECUTOR: ExecutorId = ExecutorId::new("chown_autoprov_config");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChownAutoprovSettings {
    pub config_file: PathBuf,
    pub owner: String,
}

impl Default for ChownAutoprovSettings {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("/etc/asterisk/pjsip.d/05-autoprov-wizard.conf"),
            owner: "asterisk".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub uid: Uid,
    pub gid: Gid,
}

impl From<User> for Account {
    fn from(user: User) -> Self {
        Self {
            uid: user.uid,
            gid: user.gid,
        }
    }
}

/// Resolves a local account by name; `Ok(None)` when it does not exist.
pub fn lookup_account(name: &str) -> nix::Result<Option<Account>> {
    Ok(User::from_name(name)?.map(Account::from))
}

pub struct ChownAutoprovExecutor {
    settings: ChownAutoprovSettings,
}

impl ChownAutoprovExecutor {
    pub fn new(settings: ChownAutoprovSettings) -> Self {
        Self { settings }
    }

    fn chown(&self, path: &Path) {
        let owner = &self.settings.owner;
        let account = match lookup_account(owner) {
            Ok(Some(account)) => account,
            Ok(None) => {
                warn!("Failed to find user {owner}, not changing owner of {}", path.display());
                return;
            }
            Err(err) => {
                warn!("Failed to look up user {owner}: {err}");
                return;
            }
        };

        match nix::unistd::chown(path, Some(account.uid), Some(account.gid)) {
            Ok(()) => info!("{} now owned by {owner}", path.display()),
            Err(err) => warn!(
                "Failed to chown autoprov configuration file {}: {err}",
                path.display()
            ),
        }
    }
}

#[async_trait]
impl Executor for ChownAutoprovExecutor {
    fn id(&self) -> ExecutorId {
        CHOWN_AUTOPROV_EXECUTOR
    }

    /// The command value is informational; the target file is configured.
    async fn execute(
        &self,
        _command: &Command,
        _data: &Value,
        _options: &RequestOptions,
    ) -> Result<()> {
        self.chown(&self.settings.config_file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CommandFactory, SimpleCommandFactory};
    use std::os::unix::fs::MetadataExt;
    use std::sync::Arc;
    use uuid::Uuid;

    fn current_user() -> Option<(String, Account)> {
        let user = User::from_uid(nix::unistd::getuid()).ok()??;
        Some((user.name.clone(), Account::from(user)))
    }

    #[test]
    fn unknown_account_is_none() {
        assert_eq!(lookup_account("no-such-user-sysconf-test").unwrap(), None);
    }

    #[test]
    fn root_account_resolves() {
        assert_eq!(
            lookup_account("root").unwrap(),
            Some(Account {
                uid: Uid::from_raw(0),
                gid: Gid::from_raw(0),
            })
        );
    }

    #[tokio::test]
    async fn chown_applies_configured_owner() {
        let Some((name, account)) = current_user() else {
            return;
        };
        let file = tempfile::NamedTempFile::new().unwrap();
        let executor = Arc::new(ChownAutoprovExecutor::new(ChownAutoprovSettings {
            config_file: file.path().to_path_buf(),
            owner: name,
        }));
        let command = SimpleCommandFactory::new(executor)
            .new_command("anything", Uuid::new_v4(), RequestOptions::default())
            .unwrap();

        command.execute().await;

        let meta = std::fs::metadata(file.path()).unwrap();
        assert_eq!(meta.uid(), account.uid.as_raw());
    }

    #[tokio::test]
    async fn missing_owner_or_file_is_not_an_error() {
        let executor = ChownAutoprovExecutor::new(ChownAutoprovSettings {
            config_file: PathBuf::from("/nonexistent/sysconf/autoprov.conf"),
            owner: "no-such-user-sysconf-test".to_string(),
        });
        let factory = SimpleCommandFactory::new(Arc::new(ChownAutoprovExecutor::new(
            ChownAutoprovSettings::default(),
        )));
        let command = factory
            .new_command("x", Uuid::new_v4(), RequestOptions::default())
            .unwrap();

        assert!(executor
            .execute(&command, command.data(), &command.options())
            .await
            .is_ok());

        let missing_file = ChownAutoprovExecutor::new(ChownAutoprovSettings {
            config_file: PathBuf::from("/nonexistent/sysconf/autoprov.conf"),
            owner: "root".to_string(),
        });
        assert!(missing_file
            .execute(&command, command.data(), &command.options())
            .await
            .is_ok());
    }
}
