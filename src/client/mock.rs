use super::{Client, Result, StoreError};
use crate::types::{BillingMode, Item, KeySchema, Sample, TableStatus, ATTR_ID};

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use tokio::time::{sleep, Duration};

/// What the n-th batch write call should do instead of writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFault {
    Throttle,
    Unprocessed,
    /// Reports every item unprocessed twice.
    Inflated,
}

#[derive(Debug)]
struct Table {
    status: TableStatus,
    polls_left: u32,
    items: HashMap<String, Item>,
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<String, Table>,
    deleting: BTreeMap<String, u32>,
    transition_polls: u32,
    busy_creates: u32,
    batch_calls: usize,
    batch_faults: HashMap<usize, BatchFault>,
    rejected_ids: HashSet<u64>,
    unreachable: bool,
    forget_reads: bool,
    batch_latency: Option<Duration>,
    in_flight: usize,
    peak_in_flight: usize,
    calls: usize,
}

/// In-memory store with scripted failures and asynchronous table transitions.
#[derive(Debug, Default)]
pub struct MockClient {
    state: Mutex<State>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an active table holding `count` placeholder items.
    pub fn with_table(self, table: &str, count: u64) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let items = (0..count)
                .map(|id| {
                    let sample = Sample {
                        id,
                        timestamp: 0,
                        series_label: "A".into(),
                        value: 0.0,
                    };
                    (id.to_string(), Item::from(&sample))
                })
                .collect();

            state.tables.insert(
                table.into(),
                Table {
                    status: TableStatus::Active,
                    polls_left: 0,
                    items,
                },
            );
        }
        self
    }

    /// Number of `describe_table` polls a create or delete stays in progress.
    pub fn transition_polls(self, polls: u32) -> Self {
        self.state.lock().unwrap().transition_polls = polls;
        self
    }

    /// Rejects the next `times` create requests with `ResourceInUse`.
    pub fn busy_creates(self, times: u32) -> Self {
        self.state.lock().unwrap().busy_creates = times;
        self
    }

    /// `call` is the 1-based index of the batch write call.
    pub fn fail_batch(self, call: usize, fault: BatchFault) -> Self {
        self.state.lock().unwrap().batch_faults.insert(call, fault);
        self
    }

    pub fn reject_forever(self, id: u64) -> Self {
        self.state.lock().unwrap().rejected_ids.insert(id);
        self
    }

    pub fn unreachable(self) -> Self {
        self.state.lock().unwrap().unreachable = true;
        self
    }

    /// `get_item` finds nothing, whatever was written.
    pub fn forget_reads(self) -> Self {
        self.state.lock().unwrap().forget_reads = true;
        self
    }

    /// Every batch write takes `latency` before it is applied.
    pub fn batch_latency(self, latency: Duration) -> Self {
        self.state.lock().unwrap().batch_latency = Some(latency);
        self
    }

    /// Most batch writes that were in progress at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.state.lock().unwrap().peak_in_flight
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn batch_calls(&self) -> usize {
        self.state.lock().unwrap().batch_calls
    }

    pub fn item_count(&self, table: &str) -> Option<usize> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .map(|t| t.items.len())
    }

    fn enter(&self) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        if state.unreachable {
            return Err(StoreError::Unreachable("connection refused".into()));
        }

        Ok(state)
    }

    fn apply_batch(&self, table: &str, items: Vec<Item>) -> Result<Vec<Item>> {
        let mut state = self.state.lock().unwrap();
        assert!(items.len() <= 25, "batch of {} items", items.len());

        state.batch_calls += 1;
        let call = state.batch_calls;

        match state.batch_faults.remove(&call) {
            Some(BatchFault::Throttle) => {
                return Err(StoreError::Throttled("slow down".into()));
            }
            Some(BatchFault::Unprocessed) => return Ok(items),
            Some(BatchFault::Inflated) => {
                return Ok(items.iter().chain(items.iter()).cloned().collect());
            }
            None => {}
        }

        let rejected = state.rejected_ids.clone();
        let target = active_table(&mut state, table)?;
        let mut unprocessed: Vec<Item> = vec![];

        for item in items {
            let id = Sample::id_of(&item);
            match (id, key_of(&item)) {
                (Some(id), _) if rejected.contains(&id) => unprocessed.push(item),
                (_, Some(key)) => {
                    target.items.insert(key, item);
                }
                (_, None) => return Err(StoreError::Rejected("missing key".into())),
            }
        }

        Ok(unprocessed)
    }
}

/// Leaves the in-flight count when a batch write finishes or is dropped.
struct InFlight<'a>(&'a Mutex<State>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.0.lock() {
            state.in_flight -= 1;
        }
    }
}

fn active_table<'a>(state: &'a mut State, table: &str) -> Result<&'a mut Table> {
    match state.tables.get_mut(table) {
        Some(t) if t.status == TableStatus::Active => Ok(t),
        _ => Err(StoreError::NotFound(format!("table `{table}`"))),
    }
}

fn key_of(item: &Item) -> Option<String> {
    item.number(ATTR_ID).map(str::to_string)
}

#[async_trait]
impl Client for MockClient {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let state = self.enter()?;
        Ok(state
            .tables
            .keys()
            .chain(state.deleting.keys())
            .cloned()
            .collect())
    }

    async fn describe_table(&self, table: &str) -> Result<Option<TableStatus>> {
        let mut state = self.enter()?;

        if let Some(polls) = state.deleting.get_mut(table) {
            if *polls > 0 {
                *polls -= 1;
                return Ok(Some(TableStatus::Deleting));
            }
            state.deleting.remove(table);
            return Ok(None);
        }

        Ok(state.tables.get_mut(table).map(|t| {
            if t.polls_left > 0 {
                t.polls_left -= 1;
            } else {
                t.status = TableStatus::Active;
            }
            t.status
        }))
    }

    async fn delete_table(&self, table: &str) -> Result<()> {
        let mut state = self.enter()?;

        if state.deleting.contains_key(table) {
            return Err(StoreError::ResourceInUse(format!("table `{table}`")));
        }

        match state.tables.remove(table) {
            Some(_) => {
                let polls = state.transition_polls;
                if polls > 0 {
                    state.deleting.insert(table.into(), polls);
                }
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("table `{table}`"))),
        }
    }

    async fn create_table(&self, table: &str, key: &KeySchema, _billing: BillingMode) -> Result<()> {
        let mut state = self.enter()?;
        assert_eq!(key.attribute, ATTR_ID);

        if state.busy_creates > 0 {
            state.busy_creates -= 1;
            return Err(StoreError::ResourceInUse("concurrent table operation".into()));
        }

        if state.tables.contains_key(table) || state.deleting.contains_key(table) {
            return Err(StoreError::ResourceInUse(format!("table `{table}`")));
        }

        let polls = state.transition_polls;
        state.tables.insert(
            table.into(),
            Table {
                status: if polls > 0 {
                    TableStatus::Creating
                } else {
                    TableStatus::Active
                },
                polls_left: polls,
                items: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        let mut state = self.enter()?;
        let key = key_of(&item).ok_or_else(|| StoreError::Rejected("missing key".into()))?;
        active_table(&mut state, table)?.items.insert(key, item);
        Ok(())
    }

    async fn batch_write(&self, table: &str, items: Vec<Item>) -> Result<Vec<Item>> {
        let latency = {
            let mut state = self.enter()?;
            state.in_flight += 1;
            state.peak_in_flight = state.peak_in_flight.max(state.in_flight);
            state.batch_latency
        };

        let _in_flight = InFlight(&self.state);
        if let Some(latency) = latency {
            sleep(latency).await;
        }

        self.apply_batch(table, items)
    }

    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>> {
        let mut state = self.enter()?;
        let key = key_of(&key).ok_or_else(|| StoreError::Rejected("missing key".into()))?;
        if state.forget_reads {
            return Ok(None);
        }
        Ok(active_table(&mut state, table)?.items.get(&key).cloned())
    }
}
