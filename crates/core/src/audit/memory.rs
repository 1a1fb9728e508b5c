use std::collections::VecDeque;
use std::sync::Mutex;

use super::{AuditError, AuditFilter, AuditRecord, AuditStore};

/// Bounded in-memory audit store. Once full, the oldest record is evicted.
pub struct MemoryAuditStore {
    capacity: usize,
    inner: Mutex<Inner>,
}

struct Inner {
    next_id: i64,
    records: VecDeque<AuditRecord>,
}

impl MemoryAuditStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                next_id: 1,
                records: VecDeque::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditStore for MemoryAuditStore {
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| AuditError::Storage(e.to_string()))?;

        let id = inner.next_id;
        inner.next_id += 1;

        let mut stored = record.clone();
        stored.id = id;
        if inner.records.len() == self.capacity {
            inner.records.pop_front();
        }
        inner.records.push_back(stored);
        Ok(id)
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| AuditError::Storage(e.to_string()))?;

        Ok(inner
            .records
            .iter()
            .rev()
            .filter(|record| filter.matches(record))
            .skip(filter.offset)
            .take(filter.limit)
            .cloned()
            .collect())
    }

    fn count(&self, filter: &AuditFilter) -> Result<usize, AuditError> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| AuditError::Storage(e.to_string()))?;

        Ok(inner
            .records
            .iter()
            .filter(|record| filter.matches(record))
            .count())
    }
}
