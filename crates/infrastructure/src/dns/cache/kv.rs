use compact_str::CompactString;
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Value cell of the per-namespace key-value store.
#[derive(Clone)]
pub enum KvValue {
    Str(Arc<str>),
    Int(i64),
    Bool(bool),
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl KvValue {
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self::Opaque(Arc::new(value))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Opaque(value) => Arc::clone(value).downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for KvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl From<&str> for KvValue {
    fn from(value: &str) -> Self {
        Self::Str(Arc::from(value))
    }
}

impl From<String> for KvValue {
    fn from(value: String) -> Self {
        Self::Str(Arc::from(value))
    }
}

impl From<i64> for KvValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for KvValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Resolver-side flags of one namespace. No cross-key atomicity.
#[derive(Debug, Default)]
pub struct KvStore {
    cells: DashMap<CompactString, KvValue, FxBuildHasher>,
}

impl KvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: &str, value: impl Into<KvValue>) {
        self.cells.insert(CompactString::from(key), value.into());
    }

    pub fn get(&self, key: &str) -> Option<KvValue> {
        self.cells.get(key).map(|cell| cell.value().clone())
    }

    /// `None` for an absent key and for a value of another type alike.
    pub fn get_string(&self, key: &str) -> Option<Arc<str>> {
        self.cells.get(key).and_then(|cell| match cell.value() {
            KvValue::Str(s) => Some(Arc::clone(s)),
            _ => None,
        })
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.cells.get(key).and_then(|cell| cell.value().as_int())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.cells.get(key).and_then(|cell| cell.value().as_bool())
    }
}
