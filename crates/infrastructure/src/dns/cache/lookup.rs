use super::item::RecordExtra;
use hickory_proto::op::Message;
use hickory_proto::rr::Record;
use std::sync::Arc;

/// Outcome of a cache retrieval.
///
/// `Miss` means the namespace or the domain is unknown. `NoSecureData` is
/// only produced for DNSSEC retrievals on a known domain and tells the
/// caller that nothing valid is stored, which is not the same as `Miss`.
#[derive(Debug, Clone, Default)]
pub enum CacheLookup {
    #[default]
    Miss,
    Records {
        records: Vec<Record>,
        extra: Option<Arc<RecordExtra>>,
    },
    Response(Box<Message>),
    NoSecureData,
}

impl CacheLookup {
    pub fn as_records(&self) -> Option<&[Record]> {
        match self {
            Self::Records { records, .. } => Some(records),
            _ => None,
        }
    }

    pub fn into_records(self) -> Option<Vec<Record>> {
        match self {
            Self::Records { records, .. } => Some(records),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Response(message) => Some(message),
            _ => None,
        }
    }

    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::Response(message) => Some(*message),
            _ => None,
        }
    }

    pub fn extra(&self) -> Option<&Arc<RecordExtra>> {
        match self {
            Self::Records { extra, .. } => extra.as_ref(),
            _ => None,
        }
    }

    #[inline]
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }

    #[inline]
    pub fn is_no_secure_data(&self) -> bool {
        matches!(self, Self::NoSecureData)
    }

    /// True when nothing usable came back, whatever the reason.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Records { records, .. } => records.is_empty(),
            Self::Response(_) => false,
            Self::Miss | Self::NoSecureData => true,
        }
    }
}
