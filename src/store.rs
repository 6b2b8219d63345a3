use crate::errors::RemoteError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tokio::sync::watch;

/// The authoritative counters shared by every widget instance.
///
/// Each path holds one non-negative integer. Read-modify-write goes through
/// [`CounterStore::transaction`], which is linearizable per store.
#[derive(Default)]
pub struct CounterStore {
    counters: Mutex<BTreeMap<String, Counter>>,
}

struct Counter {
    value: watch::Sender<u64>,
    written: bool,
}

impl Counter {
    fn new(value: u64, written: bool) -> Self {
        let (value, _rx) = watch::channel(value);
        Self { value, written }
    }
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: BTreeMap<String, u64>) -> Self {
        let counters = snapshot
            .into_iter()
            .map(|(path, value)| (path, Counter::new(value, true)))
            .collect();
        Self {
            counters: Mutex::new(counters),
        }
    }

    /// Current value, 0 if the path was never written.
    pub fn get(&self, path: &str) -> u64 {
        self.counters
            .lock()
            .get(path)
            .map_or(0, |counter| *counter.value.borrow())
    }

    /// Applies `update` to the current value (`None` if never written) and stores the result.
    pub fn transaction(&self, path: &str, update: impl FnOnce(Option<u64>) -> u64) -> u64 {
        let mut counters = self.counters.lock();
        let counter = counters
            .entry(path.to_string())
            .or_insert_with(|| Counter::new(0, false));
        let current = counter.written.then(|| *counter.value.borrow());
        let next = update(current);
        counter.value.send_replace(next);
        counter.written = true;
        next
    }

    pub fn increment(&self, path: &str) -> u64 {
        self.transaction(path, |current| current.unwrap_or(0).saturating_add(1))
    }

    /// A receiver that always holds the latest value of `path`.
    pub fn watch(&self, path: &str) -> watch::Receiver<u64> {
        self.counters
            .lock()
            .entry(path.to_string())
            .or_insert_with(|| Counter::new(0, false))
            .value
            .subscribe()
    }

    /// Forgets `path` if it was never written and nobody watches it any more.
    pub fn release(&self, path: &str) {
        let mut counters = self.counters.lock();
        let idle = counters
            .get(path)
            .is_some_and(|counter| !counter.written && counter.value.receiver_count() == 0);
        if idle {
            counters.remove(path);
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.counters.lock().len()
    }

    /// Every counter that has been written at least once.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counters
            .lock()
            .iter()
            .filter(|(_, counter)| counter.written)
            .map(|(path, counter)| (path.clone(), *counter.value.borrow()))
            .collect()
    }
}

/// Checks that `path` has the `group/name` shape the store accepts.
pub fn check_path(path: &str) -> Result<(), RemoteError> {
    let mut segments = path.split('/');
    let valid = matches!(
        (segments.next(), segments.next(), segments.next()),
        (Some(group), Some(name), None) if is_segment(group) && is_segment(name)
    );
    if valid {
        Ok(())
    } else {
        Err(RemoteError::InvalidPath(path.to_string()))
    }
}

pub fn counter_path(group: &str, name: &str) -> Result<String, RemoteError> {
    let path = format!("{group}/{name}");
    check_path(&path)?;
    Ok(path)
}

fn is_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
