pub mod alumni_service;
pub mod error;
pub mod lifecycle;
pub mod pagination;
pub mod pekerjaan_service;
pub mod policy;
pub mod report_service;
pub mod user_service;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::store::{Document, StoreError};

pub use alumni_service::AlumniService;
pub use error::{ServiceError, ServiceResult};
pub use lifecycle::{Lifecycle, RecordState};
pub use pekerjaan_service::PekerjaanService;
pub use report_service::ReportService;
pub use user_service::UserService;

/// Decode a stored document into its model type.
pub(crate) fn decode<T: DeserializeOwned>(doc: Document) -> ServiceResult<T> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| ServiceError::Store(StoreError::Decode(e.to_string())))
}

pub(crate) fn decode_all<T: DeserializeOwned>(docs: Vec<Document>) -> ServiceResult<Vec<T>> {
    docs.into_iter().map(decode).collect()
}

/// Trimmed, non-empty text or `None`.
pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
