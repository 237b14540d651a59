//! In-process repository
//!
//! A complete [`Repository`] kept in memory. Besides backing tests and demos
//! it journals every call so callers can assert on repository traffic.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Mutex;

use super::core::{
    fields, ColumnHeaders, FieldSelection, FilterSpec, Hook, MetaCompare, MetaPredicate, Record,
    RecordFields, Repository, RepositoryResult, SortOrder,
};
use crate::error::RepositoryError;
use crate::value::parse_number;

/// Status assigned to records inserted without one
const DEFAULT_RECORD_STATUS: &str = "draft";

/// Status given to records removed without `permanent`
const TRASH_STATUS: &str = "trash";

/// Status filter value matching every record
const ANY_STATUS: &str = "any";

/// One journaled repository operation
#[derive(Debug, Clone, PartialEq)]
pub enum RepositoryCall {
    InsertRecord { fields: RecordFields },
    UpdateRecord { id: u64, fields: RecordFields },
    DeleteRecord { id: u64, permanent: bool },
    FetchRecord { id: u64 },
    FetchRecords { filter: FilterSpec },
    GetAttribute { id: u64, key: String },
    SetAttribute { id: u64, key: String, value: String },
    DeleteAttribute { id: u64, key: String },
    RegisterEntityKind { key: String },
    RegisterHook { name: String },
}

impl RepositoryCall {
    /// Whether the call changes stored records or attributes
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            RepositoryCall::InsertRecord { .. }
                | RepositoryCall::UpdateRecord { .. }
                | RepositoryCall::DeleteRecord { .. }
                | RepositoryCall::SetAttribute { .. }
                | RepositoryCall::DeleteAttribute { .. }
        )
    }
}

#[derive(Debug)]
pub struct InMemoryRepository {
    records: DashMap<u64, Record>,
    attributes: DashMap<u64, BTreeMap<String, String>>,
    kinds: DashMap<String, JsonValue>,
    hooks: DashMap<String, Vec<Hook>>,
    next_id: AtomicU64,
    hooks_supported: AtomicBool,
    insert_failure: Mutex<Option<RepositoryError>>,
    update_failure: Mutex<Option<RepositoryError>>,
    journal: Mutex<Vec<RepositoryCall>>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Repository whose first inserted record gets `id`
    pub fn starting_at(id: u64) -> Self {
        Self {
            records: DashMap::new(),
            attributes: DashMap::new(),
            kinds: DashMap::new(),
            hooks: DashMap::new(),
            next_id: AtomicU64::new(id.max(1)),
            hooks_supported: AtomicBool::new(true),
            insert_failure: Mutex::new(None),
            update_failure: Mutex::new(None),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Turn the hook capability off; `register_hook` then reports `Unsupported`
    pub fn without_hooks(self) -> Self {
        self.hooks_supported.store(false, AtomicOrdering::SeqCst);
        self
    }

    pub fn fail_inserts(&self, error: Option<RepositoryError>) {
        *lock(&self.insert_failure) = error;
    }

    pub fn fail_updates(&self, error: Option<RepositoryError>) {
        *lock(&self.update_failure) = error;
    }

    /// Store a record directly, bypassing the journal
    pub fn seed_record(&self, record: Record) {
        self.next_id
            .fetch_max(record.id + 1, AtomicOrdering::SeqCst);
        self.records.insert(record.id, record);
    }

    /// Store an attribute directly, bypassing the journal
    pub fn seed_attribute(&self, id: u64, key: &str, value: &str) {
        self.attributes
            .entry(id)
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub fn record(&self, id: u64) -> Option<Record> {
        self.records.get(&id).map(|record| record.clone())
    }

    pub fn attribute(&self, id: u64, key: &str) -> Option<String> {
        self.attributes
            .get(&id)
            .and_then(|attributes| attributes.get(key).cloned())
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn entity_kind(&self, key: &str) -> Option<JsonValue> {
        self.kinds.get(key).map(|kind| kind.clone())
    }

    pub fn has_hook(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }

    /// Run every hook registered under `name` over `headers`, by priority
    pub fn apply_hooks(&self, name: &str, headers: ColumnHeaders) -> ColumnHeaders {
        let mut hooks = match self.hooks.get(name) {
            Some(hooks) => hooks.clone(),
            None => return headers,
        };
        hooks.sort_by_key(|hook| hook.priority);

        hooks
            .iter()
            .fold(headers, |headers, hook| hook.apply(headers))
    }

    pub fn calls(&self) -> Vec<RepositoryCall> {
        lock(&self.journal).clone()
    }

    pub fn write_calls(&self) -> Vec<RepositoryCall> {
        lock(&self.journal)
            .iter()
            .filter(|call| call.is_write())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        lock(&self.journal).clear();
    }

    fn log(&self, call: RepositoryCall) {
        tracing::trace!("repository call: {:?}", call);
        lock(&self.journal).push(call);
    }

    fn matches(&self, record: &Record, filter: &FilterSpec) -> bool {
        if let Some(record_type) = &filter.record_type {
            if &record.record_type != record_type {
                return false;
            }
        }

        match filter.status.as_deref() {
            Some(ANY_STATUS) | None => {}
            Some(status) => {
                if record.status != status {
                    return false;
                }
            }
        }

        if let Some(search) = &filter.search {
            let needle = search.to_lowercase();
            if !record.title.to_lowercase().contains(&needle)
                && !record.body.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        let attributes = self.attributes.get(&record.id);

        filter.meta_query.iter().all(|predicate| {
            let stored = attributes
                .as_ref()
                .and_then(|attributes| attributes.get(&predicate.key).cloned());
            evaluate(predicate, stored.as_deref())
        })
    }

    fn sort_key(&self, record: &Record, column: &str) -> Option<String> {
        match column {
            "id" | "ID" | "date" => None,
            field => match record.field(field) {
                Some(value) => Some(value.to_string()),
                None => self.attribute(record.id, field),
            },
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Compare two stored strings, numerically when both are numbers
fn compare_values(left: &str, right: &str) -> Ordering {
    match (parse_number(left), parse_number(right)) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => left.cmp(right),
    }
}

fn evaluate(predicate: &MetaPredicate, stored: Option<&str>) -> bool {
    match predicate.compare {
        MetaCompare::Exists => return stored.is_some(),
        MetaCompare::NotExists => return stored.is_none(),
        _ => {}
    }

    let stored = match stored {
        Some(stored) => stored,
        None => return false,
    };

    let operands = predicate
        .value
        .as_ref()
        .map(|value| value.to_strings())
        .unwrap_or_default();
    let first = operands.first().map(String::as_str).unwrap_or("");

    match predicate.compare {
        MetaCompare::Eq => compare_values(stored, first) == Ordering::Equal,
        MetaCompare::NotEq => compare_values(stored, first) != Ordering::Equal,
        MetaCompare::Gt => compare_values(stored, first) == Ordering::Greater,
        MetaCompare::Gte => compare_values(stored, first) != Ordering::Less,
        MetaCompare::Lt => compare_values(stored, first) == Ordering::Less,
        MetaCompare::Lte => compare_values(stored, first) != Ordering::Greater,
        MetaCompare::Like => stored.to_lowercase().contains(&first.to_lowercase()),
        MetaCompare::NotLike => !stored.to_lowercase().contains(&first.to_lowercase()),
        MetaCompare::In => operands
            .iter()
            .any(|operand| compare_values(stored, operand) == Ordering::Equal),
        MetaCompare::NotIn => !operands
            .iter()
            .any(|operand| compare_values(stored, operand) == Ordering::Equal),
        MetaCompare::Between | MetaCompare::NotBetween => {
            let inside = match (operands.first(), operands.get(1)) {
                (Some(low), Some(high)) => {
                    compare_values(stored, low) != Ordering::Less
                        && compare_values(stored, high) != Ordering::Greater
                }
                _ => false,
            };
            inside == (predicate.compare == MetaCompare::Between)
        }
        MetaCompare::Exists | MetaCompare::NotExists => unreachable!("presence handled above"),
    }
}

fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());

    for c in title.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }

    slug.trim_end_matches('-').to_string()
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert_record(&self, values: RecordFields) -> RepositoryResult<u64> {
        self.log(RepositoryCall::InsertRecord {
            fields: values.clone(),
        });

        if let Some(error) = lock(&self.insert_failure).clone() {
            return Err(error);
        }

        let record_type = values
            .get(fields::RECORD_TYPE)
            .filter(|record_type| !record_type.is_empty())
            .ok_or_else(|| RepositoryError::Rejected("Record type is required.".to_string()))?;

        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        let mut record = Record::new(id, record_type.clone());
        record.apply(&values);

        if record.status.is_empty() {
            record.status = DEFAULT_RECORD_STATUS.to_string();
        }

        if record.slug.is_empty() {
            record.slug = slugify(&record.title);
        }

        self.records.insert(id, record);

        Ok(id)
    }

    async fn update_record(&self, id: u64, values: RecordFields) -> RepositoryResult<u64> {
        self.log(RepositoryCall::UpdateRecord {
            id,
            fields: values.clone(),
        });

        if let Some(error) = lock(&self.update_failure).clone() {
            return Err(error);
        }

        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::Rejected("Invalid record ID.".to_string()))?;
        record.apply(&values);

        Ok(id)
    }

    async fn delete_record(&self, id: u64, permanent: bool) -> RepositoryResult<()> {
        self.log(RepositoryCall::DeleteRecord { id, permanent });

        if permanent {
            self.records.remove(&id);
            self.attributes.remove(&id);
        } else if let Some(mut record) = self.records.get_mut(&id) {
            record.status = TRASH_STATUS.to_string();
        }

        Ok(())
    }

    async fn fetch_record(&self, id: u64) -> RepositoryResult<Option<Record>> {
        self.log(RepositoryCall::FetchRecord { id });

        Ok(self.record(id))
    }

    async fn fetch_records(&self, filter: &FilterSpec) -> RepositoryResult<Vec<Record>> {
        self.log(RepositoryCall::FetchRecords {
            filter: filter.clone(),
        });

        let mut records: Vec<Record> = self
            .records
            .iter()
            .filter(|entry| self.matches(entry.value(), filter))
            .map(|entry| entry.value().clone())
            .collect();

        records.sort_by_key(|record| record.id);

        if let Some(column) = filter.order_by.as_deref() {
            records.sort_by(|a, b| match (self.sort_key(a, column), self.sort_key(b, column)) {
                (Some(x), Some(y)) => compare_values(&x, &y).then(a.id.cmp(&b.id)),
                (None, None) => a.id.cmp(&b.id),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
            });
        }

        if filter.order == Some(SortOrder::Desc) {
            records.reverse();
        }

        if let Some(limit) = filter.limit.filter(|limit| *limit >= 0) {
            records.truncate(limit as usize);
        }

        if filter.fields == FieldSelection::Ids {
            records = records
                .into_iter()
                .map(|record| Record::new(record.id, record.record_type))
                .collect();
        }

        Ok(records)
    }

    async fn get_attribute(&self, id: u64, key: &str) -> RepositoryResult<Option<String>> {
        self.log(RepositoryCall::GetAttribute {
            id,
            key: key.to_string(),
        });

        Ok(self.attribute(id, key))
    }

    async fn set_attribute(&self, id: u64, key: &str, value: &str) -> RepositoryResult<()> {
        self.log(RepositoryCall::SetAttribute {
            id,
            key: key.to_string(),
            value: value.to_string(),
        });

        self.seed_attribute(id, key, value);

        Ok(())
    }

    async fn delete_attribute(&self, id: u64, key: &str) -> RepositoryResult<()> {
        self.log(RepositoryCall::DeleteAttribute {
            id,
            key: key.to_string(),
        });

        if let Some(mut attributes) = self.attributes.get_mut(&id) {
            attributes.remove(key);
        }

        Ok(())
    }

    async fn register_entity_kind(&self, key: &str, definition: &JsonValue) -> RepositoryResult<()> {
        self.log(RepositoryCall::RegisterEntityKind {
            key: key.to_string(),
        });

        self.kinds.insert(key.to_string(), definition.clone());

        Ok(())
    }

    async fn register_hook(&self, hook: Hook) -> RepositoryResult<()> {
        self.log(RepositoryCall::RegisterHook {
            name: hook.name.clone(),
        });

        if !self.hooks_supported.load(AtomicOrdering::SeqCst) {
            return Err(RepositoryError::Unsupported(format!("hook [{}]", hook.name)));
        }

        self.hooks.entry(hook.name.clone()).or_default().push(hook);

        Ok(())
    }
}
