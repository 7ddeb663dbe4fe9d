use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use backup_guard::errors::{MetricsError, PowerError, SecretError};
use backup_guard::exec::{CommandResult, CommandRunner, CommandStatus, Invocation, RunContext};
use backup_guard::metrics::{MetricPoint, MetricsSink};
use backup_guard::orchestrator::Collaborators;
use backup_guard::power::PowerSource;
use backup_guard::secrets::{SecretStore, SECRET_SPECS};
use backup_guard::types::BoxFuture;

/// A fake runner that:
/// - records every invocation
/// - returns a canned result per operation (first argument), success with
///   no output by default.
#[derive(Clone)]
pub struct FakeRunner {
    invocations: Arc<Mutex<Vec<Invocation>>>,
    results: Arc<Mutex<HashMap<String, CommandResult>>>,
    resolvable: bool,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            invocations: Arc::new(Mutex::new(Vec::new())),
            results: Arc::new(Mutex::new(HashMap::new())),
            resolvable: true,
        }
    }

    pub fn with_result(self, operation: &str, result: CommandResult) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(operation.to_string(), result);
        self
    }

    /// Make `resolve_executable` report the engine as missing.
    pub fn unresolvable(mut self) -> Self {
        self.resolvable = false;
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(|i| i.operation().to_string())
            .collect()
    }
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for FakeRunner {
    fn run<'a>(
        &'a self,
        _ctx: &'a RunContext,
        invocation: &'a Invocation,
    ) -> BoxFuture<'a, CommandResult> {
        let invocations = Arc::clone(&self.invocations);
        let results = Arc::clone(&self.results);

        Box::pin(async move {
            invocations.lock().unwrap().push(invocation.clone());
            results
                .lock()
                .unwrap()
                .get(invocation.operation())
                .cloned()
                .unwrap_or_else(|| CommandResult::from_status(CommandStatus::Exited(0)))
        })
    }

    fn resolve_executable(&self, program: &Path) -> Option<PathBuf> {
        self.resolvable.then(|| program.to_path_buf())
    }
}

/// How a fake secret lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretFailure {
    Timeout,
    Failed,
    Empty,
}

/// Secret store answering every known account with `secret-<account>`
/// unless told to fail it.
#[derive(Clone)]
pub struct FakeSecretStore {
    failures: Arc<Mutex<HashMap<String, SecretFailure>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeSecretStore {
    pub fn new() -> Self {
        Self {
            failures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(self, account: &str, failure: SecretFailure) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(account.to_string(), failure);
        self
    }

    /// `(service, account)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn value_for(account: &str) -> String {
        format!("secret-{account}")
    }
}

impl Default for FakeSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for FakeSecretStore {
    fn fetch<'a>(
        &'a self,
        service: &'a str,
        account: &'a str,
    ) -> BoxFuture<'a, Result<String, SecretError>> {
        let failures = Arc::clone(&self.failures);
        let calls = Arc::clone(&self.calls);

        Box::pin(async move {
            calls
                .lock()
                .unwrap()
                .push((service.to_string(), account.to_string()));

            let failure = failures.lock().unwrap().get(account).copied();
            match failure {
                Some(SecretFailure::Timeout) => Err(SecretError::Timeout {
                    service: service.to_string(),
                    account: account.to_string(),
                    timeout: Duration::from_secs(60),
                }),
                Some(SecretFailure::Failed) => Err(SecretError::Failed {
                    service: service.to_string(),
                    account: account.to_string(),
                    status: "exit status: 44".to_string(),
                    stderr: "The specified item could not be found in the keychain.".to_string(),
                }),
                Some(SecretFailure::Empty) => Ok(String::new()),
                None if SECRET_SPECS.iter().any(|s| s.account == account) => {
                    Ok(Self::value_for(account))
                }
                None => Err(SecretError::Empty {
                    service: service.to_string(),
                    account: account.to_string(),
                }),
            }
        })
    }
}

/// Fixed power state, or a broken status command.
#[derive(Clone)]
pub struct FakePowerSource {
    state: Option<bool>,
    calls: Arc<Mutex<usize>>,
}

impl FakePowerSource {
    pub fn ac() -> Self {
        Self::with_state(Some(true))
    }

    pub fn battery() -> Self {
        Self::with_state(Some(false))
    }

    pub fn broken() -> Self {
        Self::with_state(None)
    }

    fn with_state(state: Option<bool>) -> Self {
        Self {
            state,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl PowerSource for FakePowerSource {
    fn is_on_ac_power<'a>(&'a self, _ctx: &'a RunContext) -> BoxFuture<'a, Result<bool, PowerError>> {
        *self.calls.lock().unwrap() += 1;
        let state = self.state;
        Box::pin(async move {
            state.ok_or_else(|| PowerError::Failed {
                program: "pmset".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "pmset: unavailable".to_string(),
            })
        })
    }
}

/// Metrics sink that records every push, optionally failing them.
#[derive(Clone)]
pub struct RecordingSink {
    pushes: Arc<Mutex<Vec<(String, Vec<MetricPoint>)>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            pushes: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn pushes(&self) -> Vec<(String, Vec<MetricPoint>)> {
        self.pushes.lock().unwrap().clone()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for RecordingSink {
    fn push<'a>(
        &'a self,
        namespace: &'a str,
        points: &'a [MetricPoint],
    ) -> BoxFuture<'a, Result<(), MetricsError>> {
        let pushes = Arc::clone(&self.pushes);
        let fail = self.fail;

        Box::pin(async move {
            pushes
                .lock()
                .unwrap()
                .push((namespace.to_string(), points.to_vec()));
            if fail {
                Err(MetricsError::Sink("sink unavailable".to_string()))
            } else {
                Ok(())
            }
        })
    }
}

/// Handles onto a set of fakes, kept by the test after the boxed copies
/// move into the orchestrator.
#[derive(Clone)]
pub struct Fakes {
    pub runner: FakeRunner,
    pub secrets: FakeSecretStore,
    pub power: FakePowerSource,
    pub sink: RecordingSink,
}

impl Fakes {
    /// Engine found, AC power, every secret resolvable, every command and
    /// push succeeding.
    pub fn happy() -> Self {
        Self {
            runner: FakeRunner::new(),
            secrets: FakeSecretStore::new(),
            power: FakePowerSource::ac(),
            sink: RecordingSink::new(),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            runner: Box::new(self.runner.clone()),
            secrets: Box::new(self.secrets.clone()),
            power: Box::new(self.power.clone()),
            metrics: Box::new(self.sink.clone()),
        }
    }
}
