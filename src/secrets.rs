// src/secrets.rs

//! Credential retrieval from the local secret store.
//!
//! Five secrets are fetched once per run and only ever handed to the
//! engine's child process environment. A failed lookup is returned as a
//! [`SecretError`]; the run must not continue with a partial set.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::errors::SecretError;
use crate::exec::RunContext;
use crate::types::BoxFuture;

/// One credential: the account it is filed under in the store and the
/// environment variable the engine reads it from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretSpec {
    pub account: &'static str,
    pub env_var: &'static str,
}

pub const REGION: SecretSpec = SecretSpec {
    account: "aws-region",
    env_var: "AWS_DEFAULT_REGION",
};
pub const ACCESS_KEY_ID: SecretSpec = SecretSpec {
    account: "aws-access-key-id",
    env_var: "AWS_ACCESS_KEY_ID",
};
pub const SECRET_ACCESS_KEY: SecretSpec = SecretSpec {
    account: "aws-secret-access-key",
    env_var: "AWS_SECRET_ACCESS_KEY",
};
pub const REPOSITORY: SecretSpec = SecretSpec {
    account: "repository",
    env_var: "RESTIC_REPOSITORY",
};
pub const PASSWORD: SecretSpec = SecretSpec {
    account: "password",
    env_var: "RESTIC_PASSWORD",
};

/// All credentials, in fetch order.
pub const SECRET_SPECS: [SecretSpec; 5] =
    [REGION, ACCESS_KEY_ID, SECRET_ACCESS_KEY, REPOSITORY, PASSWORD];

/// Query interface of the secret store.
pub trait SecretStore: Send + Sync {
    fn fetch<'a>(
        &'a self,
        service: &'a str,
        account: &'a str,
    ) -> BoxFuture<'a, Result<String, SecretError>>;
}

/// Secret store backed by the macOS keychain CLI:
/// `security find-generic-password -s <service> -a <account> -w`.
#[derive(Debug, Clone)]
pub struct KeychainStore {
    program: String,
    timeout: Duration,
}

impl KeychainStore {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    async fn lookup(&self, service: &str, account: &str) -> Result<String, SecretError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["find-generic-password", "-s", service, "-a", account, "-w"])
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // Dropping the output future on timeout kills the child.
        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| SecretError::Timeout {
                service: service.to_string(),
                account: account.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|source| SecretError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SecretError::Failed {
                service: service.to_string(),
                account: account.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl SecretStore for KeychainStore {
    fn fetch<'a>(
        &'a self,
        service: &'a str,
        account: &'a str,
    ) -> BoxFuture<'a, Result<String, SecretError>> {
        Box::pin(self.lookup(service, account))
    }
}

/// The five credentials the engine needs.
///
/// `Debug` is redacted; nothing in this type is ever logged or persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretSet {
    region: String,
    access_key_id: String,
    secret_access_key: String,
    repository: String,
    password: String,
}

impl SecretSet {
    /// Fetch every credential from `store`, in [`SECRET_SPECS`] order.
    ///
    /// Stops at the first failure. Each lookup is bounded by the store's own
    /// timeout and by the run deadline, whichever comes first.
    pub async fn fetch_all(
        store: &dyn SecretStore,
        service: &str,
        ctx: &RunContext,
    ) -> Result<Self, SecretError> {
        Ok(Self {
            region: fetch_one(store, service, REGION, ctx).await?,
            access_key_id: fetch_one(store, service, ACCESS_KEY_ID, ctx).await?,
            secret_access_key: fetch_one(store, service, SECRET_ACCESS_KEY, ctx).await?,
            repository: fetch_one(store, service, REPOSITORY, ctx).await?,
            password: fetch_one(store, service, PASSWORD, ctx).await?,
        })
    }

    /// `(variable, value)` pairs for the engine's child environment.
    pub fn env(&self) -> Vec<(String, String)> {
        [
            (REGION, &self.region),
            (ACCESS_KEY_ID, &self.access_key_id),
            (SECRET_ACCESS_KEY, &self.secret_access_key),
            (REPOSITORY, &self.repository),
            (PASSWORD, &self.password),
        ]
        .into_iter()
        .map(|(spec, value)| (spec.env_var.to_string(), value.clone()))
        .collect()
    }
}

impl fmt::Debug for SecretSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretSet")
            .field("region", &"<redacted>")
            .field("access_key_id", &"<redacted>")
            .field("secret_access_key", &"<redacted>")
            .field("repository", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

async fn fetch_one(
    store: &dyn SecretStore,
    service: &str,
    spec: SecretSpec,
    ctx: &RunContext,
) -> Result<String, SecretError> {
    let budget = ctx.remaining();
    let value = tokio::time::timeout_at(ctx.deadline(), store.fetch(service, spec.account))
        .await
        .map_err(|_| SecretError::Timeout {
            service: service.to_string(),
            account: spec.account.to_string(),
            timeout: budget,
        })??;

    let value = value.trim();
    if value.is_empty() {
        return Err(SecretError::Empty {
            service: service.to_string(),
            account: spec.account.to_string(),
        });
    }

    debug!(service, account = spec.account, "secret fetched");
    Ok(value.to_string())
}
