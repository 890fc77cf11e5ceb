//! Storage capability for group data.
//!
//! [`GroupStore`] is the one interface the ledger talks to. Two local
//! variants are provided: [`MemoryStore`] keeps snapshots in process and
//! [`JsonFileStore`] persists them to a JSON file. A synced backend plugs in
//! by implementing the same trait; the engines never see the difference.

use crate::error::{LedgerError, Result};
use crate::model::{Expense, ExpenseId, GroupData, GroupId, Settlement};
use log::debug;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

/// A change applied to a group's stored data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    ExpenseSaved {
        group_id: GroupId,
        expense_id: ExpenseId,
    },
    SettlementsRecorded {
        group_id: GroupId,
        count: usize,
    },
}

impl ChangeEvent {
    pub fn group_id(&self) -> &GroupId {
        match self {
            ChangeEvent::ExpenseSaved { group_id, .. } => group_id,
            ChangeEvent::SettlementsRecorded { group_id, .. } => group_id,
        }
    }
}

/// Loads and saves group snapshots.
pub trait GroupStore {
    /// Returns the current snapshot of a group.
    fn load_group_data(&self, group_id: &GroupId) -> Result<GroupData>;

    /// Adds or replaces (by id) an expense in its group.
    fn save_expense(&mut self, expense: Expense) -> Result<()>;

    /// Adds or replaces (by id) settlements. Nothing is written unless every
    /// settlement belongs to a known group.
    fn record_settlements(&mut self, settlements: Vec<Settlement>) -> Result<()>;

    /// Returns a channel that receives every change made to `group_id`
    /// through this store.
    fn subscribe_to_changes(&mut self, group_id: &GroupId) -> Receiver<ChangeEvent>;
}

/// Fans change events out to subscribers, dropping disconnected ones.
#[derive(Debug, Default)]
struct Subscribers {
    senders: Vec<(GroupId, Sender<ChangeEvent>)>,
}

impl Subscribers {
    fn subscribe(&mut self, group_id: &GroupId) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.senders.push((group_id.clone(), tx));
        rx
    }

    fn publish(&mut self, event: ChangeEvent) {
        self.senders.retain(|(group_id, tx)| {
            group_id != event.group_id() || tx.send(event.clone()).is_ok()
        });
    }
}

/// Group snapshots keyed by group id, shared by both store variants.
type Snapshots = HashMap<GroupId, GroupData>;

fn upsert_expense(groups: &mut Snapshots, expense: Expense) -> Result<ChangeEvent> {
    let data = groups
        .get_mut(&expense.group_id)
        .ok_or_else(|| LedgerError::GroupNotFound(expense.group_id.clone()))?;

    let event = ChangeEvent::ExpenseSaved {
        group_id: expense.group_id.clone(),
        expense_id: expense.id.clone(),
    };

    match data.expenses.iter_mut().find(|e| e.id == expense.id) {
        Some(existing) => *existing = expense,
        None => data.expenses.push(expense),
    }

    Ok(event)
}

fn upsert_settlements(
    groups: &mut Snapshots,
    settlements: Vec<Settlement>,
) -> Result<Vec<ChangeEvent>> {
    if let Some(missing) = settlements.iter().find(|s| !groups.contains_key(&s.group_id)) {
        return Err(LedgerError::GroupNotFound(missing.group_id.clone()));
    }

    let mut counts: Vec<(GroupId, usize)> = Vec::new();
    for settlement in settlements {
        match counts.iter_mut().find(|(g, _)| *g == settlement.group_id) {
            Some((_, count)) => *count += 1,
            None => counts.push((settlement.group_id.clone(), 1)),
        }

        if let Some(data) = groups.get_mut(&settlement.group_id) {
            match data.settlements.iter_mut().find(|s| s.id == settlement.id) {
                Some(existing) => *existing = settlement,
                None => data.settlements.push(settlement),
            }
        }
    }

    Ok(counts
        .into_iter()
        .map(|(group_id, count)| ChangeEvent::SettlementsRecorded { group_id, count })
        .collect())
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    groups: Snapshots,
    subscribers: Subscribers,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a whole group snapshot.
    pub fn insert_group(&mut self, data: GroupData) {
        self.groups.insert(data.group.id.clone(), data);
    }
}

impl GroupStore for MemoryStore {
    fn load_group_data(&self, group_id: &GroupId) -> Result<GroupData> {
        self.groups
            .get(group_id)
            .cloned()
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.clone()))
    }

    fn save_expense(&mut self, expense: Expense) -> Result<()> {
        let event = upsert_expense(&mut self.groups, expense)?;
        self.subscribers.publish(event);
        Ok(())
    }

    fn record_settlements(&mut self, settlements: Vec<Settlement>) -> Result<()> {
        for event in upsert_settlements(&mut self.groups, settlements)? {
            self.subscribers.publish(event);
        }
        Ok(())
    }

    fn subscribe_to_changes(&mut self, group_id: &GroupId) -> Receiver<ChangeEvent> {
        self.subscribers.subscribe(group_id)
    }
}

/// Local persistent store backed by a single JSON file.
///
/// The file holds an array of group snapshots. Every write replaces it
/// atomically (temp file, fsync, rename), so a crash leaves either the old
/// or the new contents.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    groups: Snapshots,
    subscribers: Subscribers,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let groups = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let snapshots: Vec<GroupData> = serde_json::from_reader(reader)?;
            snapshots
                .into_iter()
                .map(|data| (data.group.id.clone(), data))
                .collect()
        } else {
            debug!("Store file {} does not exist yet, starting empty", path.display());
            Snapshots::new()
        };

        Ok(JsonFileStore {
            path,
            groups,
            subscribers: Subscribers::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds or replaces a whole group snapshot and persists it.
    pub fn insert_group(&mut self, data: GroupData) -> Result<()> {
        let mut groups = self.groups.clone();
        groups.insert(data.group.id.clone(), data);
        self.commit(groups)
    }

    /// Persists `groups` and only then makes them the current contents.
    fn commit(&mut self, groups: Snapshots) -> Result<()> {
        self.flush(&groups)?;
        self.groups = groups;
        Ok(())
    }

    fn flush(&self, groups: &Snapshots) -> Result<()> {
        // Sorted for stable, diffable files.
        let mut snapshots: Vec<&GroupData> = groups.values().collect();
        snapshots.sort_by(|a, b| a.group.id.cmp(&b.group.id));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        serde_json::to_writer_pretty(&mut writer, &snapshots)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!("Wrote {} groups to {}", snapshots.len(), self.path.display());
        Ok(())
    }
}

impl GroupStore for JsonFileStore {
    fn load_group_data(&self, group_id: &GroupId) -> Result<GroupData> {
        self.groups
            .get(group_id)
            .cloned()
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.clone()))
    }

    fn save_expense(&mut self, expense: Expense) -> Result<()> {
        let mut groups = self.groups.clone();
        let event = upsert_expense(&mut groups, expense)?;
        self.commit(groups)?;
        self.subscribers.publish(event);
        Ok(())
    }

    fn record_settlements(&mut self, settlements: Vec<Settlement>) -> Result<()> {
        let mut groups = self.groups.clone();
        let events = upsert_settlements(&mut groups, settlements)?;
        self.commit(groups)?;
        for event in events {
            self.subscribers.publish(event);
        }
        Ok(())
    }

    fn subscribe_to_changes(&mut self, group_id: &GroupId) -> Receiver<ChangeEvent> {
        self.subscribers.subscribe(group_id)
    }
}
