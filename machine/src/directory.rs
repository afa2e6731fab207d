use std::collections::BTreeMap;

use orbman_distro::{ActionKind, Registry};
use orbman_orb::{OrbClient, OrbError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{normalize, normalize_many, MachineRecord, MachineState};

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("machine not found: {name}")]
    MachineNotFound { name: String },

    #[error("machine already exists: {name}")]
    DuplicateName { name: String },

    #[error(transparent)]
    Orb(#[from] OrbError),
}

/// A bulk start/stop that finished with at least one failure. The
/// remaining machines were still attempted; every failure is carried
/// here for the caller to report.
#[derive(Error, Debug)]
#[error("{} of {} machines failed", .failures.len(), .attempted)]
pub struct BulkError {
    pub attempted: usize,
    pub failures: Vec<(String, DirectoryError)>,
}

/// Outcome of dispatching a lifecycle action to a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Ran,
    /// The machine's distro defines no command for this action; nothing
    /// was executed. Deliberately not an error.
    Unsupported,
}

/// Process-scoped cache of machine records, keyed (and therefore
/// iterated) by name. Loaded wholesale at construction, patched
/// incrementally by every operation that changes external state. Sole
/// owner of its records.
#[derive(Debug)]
pub struct MachineDirectory {
    client: OrbClient,
    registry: Registry,
    machines: BTreeMap<String, MachineRecord>,
}

impl MachineDirectory {
    pub async fn load(client: OrbClient, registry: Registry) -> Result<Self, DirectoryError> {
        let raw = client.list().await?;
        let mut machines = BTreeMap::new();
        for record in normalize_many(raw, &registry) {
            let name = record.name.clone();
            if machines.insert(name.clone(), record).is_some() {
                // Tool listings should never repeat a name; keep the
                // later record if one does.
                warn!(machine = %name, "duplicate name in listing, keeping the later record");
            }
        }
        Ok(Self {
            client,
            registry,
            machines,
        })
    }

    /// All records, in case-sensitive lexical name order.
    pub fn list(&self) -> impl Iterator<Item = &MachineRecord> {
        self.machines.values()
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&MachineRecord> {
        self.machines.get(name)
    }

    fn require(&self, name: &str) -> Result<&MachineRecord, DirectoryError> {
        self.machines
            .get(name)
            .ok_or_else(|| DirectoryError::MachineNotFound {
                name: name.to_owned(),
            })
    }

    /// Create a machine and register it. Idempotent by name: when the
    /// name is already present the existing record is returned and the
    /// external tool is not invoked at all.
    pub async fn create(
        &mut self,
        name: &str,
        distro: &str,
        version: Option<&str>,
        arch: &str,
    ) -> Result<&MachineRecord, DirectoryError> {
        if self.machines.contains_key(name) {
            debug!(machine = name, "machine already exists, create is a no-op");
        } else {
            self.client.create(distro, version, name, arch).await?;
            let raw = self.client.info(name).await?;
            let record = normalize(raw, &self.registry);
            self.machines.insert(record.name.clone(), record);
        }
        self.require(name)
    }

    /// Delete a machine. The record is removed only once the external
    /// delete has succeeded.
    pub async fn destroy(&mut self, name: &str, force: bool) -> Result<(), DirectoryError> {
        self.require(name)?;
        self.client.delete(name, force).await?;
        self.machines.remove(name);
        Ok(())
    }

    pub async fn start(&mut self, name: &str) -> Result<(), DirectoryError> {
        self.require(name)?;
        self.client.start(name).await?;
        self.refresh_state(name).await
    }

    pub async fn stop(&mut self, name: &str) -> Result<(), DirectoryError> {
        self.require(name)?;
        self.client.stop(name).await?;
        self.refresh_state(name).await
    }

    /// Start every machine, best-effort: a failure is recorded and the
    /// remaining machines are still attempted.
    pub async fn start_all(&mut self) -> Result<(), BulkError> {
        let names: Vec<String> = self.machines.keys().cloned().collect();
        let attempted = names.len();
        let mut failures = Vec::new();
        for name in names {
            if let Err(error) = self.start(&name).await {
                warn!(machine = %name, %error, "failed to start machine");
                failures.push((name, error));
            }
        }
        Self::bulk_result(attempted, failures)
    }

    pub async fn stop_all(&mut self) -> Result<(), BulkError> {
        let names: Vec<String> = self.machines.keys().cloned().collect();
        let attempted = names.len();
        let mut failures = Vec::new();
        for name in names {
            if let Err(error) = self.stop(&name).await {
                warn!(machine = %name, %error, "failed to stop machine");
                failures.push((name, error));
            }
        }
        Self::bulk_result(attempted, failures)
    }

    fn bulk_result(
        attempted: usize,
        failures: Vec<(String, DirectoryError)>,
    ) -> Result<(), BulkError> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(BulkError {
                attempted,
                failures,
            })
        }
    }

    /// Rename a machine, re-keying the directory entry. Renaming onto an
    /// existing name is refused before the external tool is touched.
    pub async fn rename(&mut self, name: &str, new_name: &str) -> Result<(), DirectoryError> {
        self.require(name)?;
        if self.machines.contains_key(new_name) {
            return Err(DirectoryError::DuplicateName {
                name: new_name.to_owned(),
            });
        }
        self.client.rename(name, new_name).await?;
        if let Some(mut record) = self.machines.remove(name) {
            record.name = new_name.to_owned();
            self.machines.insert(new_name.to_owned(), record);
        }
        Ok(())
    }

    /// Run one lifecycle action inside a machine, using the command
    /// resolved at record construction. A distro without a command for
    /// the action is a no-op, not an error.
    pub async fn run_action(
        &mut self,
        name: &str,
        kind: ActionKind,
    ) -> Result<ActionOutcome, DirectoryError> {
        let record = self.require(name)?;
        let Some(command) = record.command(kind) else {
            debug!(machine = name, action = %kind, "action undefined for distro, skipping");
            return Ok(ActionOutcome::Unsupported);
        };
        let command = command.to_owned();
        self.client.exec(name, &command).await?;
        Ok(ActionOutcome::Ran)
    }

    /// Open an interactive shell in a machine.
    pub async fn shell(&self, name: &str) -> Result<(), DirectoryError> {
        self.require(name)?;
        self.client.shell(name).await?;
        Ok(())
    }

    /// Re-query the external tool and patch the record's state in place.
    async fn refresh_state(&mut self, name: &str) -> Result<(), DirectoryError> {
        let raw = self.client.info(name).await?;
        if let Some(record) = self.machines.get_mut(name) {
            record.state = MachineState::from_external(raw.state.as_deref());
        }
        Ok(())
    }
}
