use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use super::error::{ServiceError, ServiceResult};
use super::lifecycle::{Lifecycle, RecordState};
use super::pagination::{resolve, ListParams, PageMeta, ALUMNI_PROFILE};
use super::policy::Action;
use super::{decode, decode_all, non_blank};
use crate::auth::Identity;
use crate::config::DenialPolicy;
use crate::models::{Alumni, CreateAlumniRequest, UpdateAlumniRequest};
use crate::schema::Collection;
use crate::store::{Document, Store};

#[derive(Clone)]
pub struct AlumniService {
    lifecycle: Lifecycle,
}

impl AlumniService {
    pub fn new(store: Arc<dyn Store>, denial: DenialPolicy) -> Self {
        Self { lifecycle: Lifecycle::new(store, Collection::Alumni, denial, "Alumni") }
    }

    /// Paginated, searchable listing of active alumni.
    pub async fn list(&self, identity: &Identity, params: &ListParams) -> ServiceResult<(Vec<Alumni>, PageMeta)> {
        let page = resolve(params, &ALUMNI_PROFILE);
        debug!(?page, "resolved alumni page");
        let listing = self
            .lifecycle
            .list(
                identity,
                RecordState::Active,
                page.search_filter(&ALUMNI_PROFILE),
                page.order_spec(),
                Some((page.limit as i64, page.offset as i64)),
            )
            .await?;
        Ok((decode_all(listing.rows)?, page.meta(listing.total)))
    }

    /// Trashed alumni, most recently deleted first.
    pub async fn list_trash(&self, identity: &Identity) -> ServiceResult<Vec<Alumni>> {
        let listing = self
            .lifecycle
            .list(identity, RecordState::Trashed, Value::Null, json!(["deleted_at desc", "id asc"]), None)
            .await?;
        decode_all(listing.rows)
    }

    pub async fn get(&self, identity: &Identity, id: i64) -> ServiceResult<Alumni> {
        decode(self.lifecycle.fetch(identity, id, RecordState::Active, Action::ReadOne).await?)
    }

    pub async fn create(&self, identity: &Identity, request: CreateAlumniRequest) -> ServiceResult<Alumni> {
        let mut errors = HashMap::new();
        let mut record = Document::new();
        for (field, value) in [
            ("nim", &request.nim),
            ("nama", &request.nama),
            ("jurusan", &request.jurusan),
            ("email", &request.email),
        ] {
            match non_blank(value) {
                Some(text) => {
                    record.insert(field.to_string(), json!(text));
                }
                None => {
                    errors.insert(field.to_string(), format!("{} is required", field));
                }
            }
        }
        if let Some(email) = non_blank(&request.email) {
            if !email.contains('@') {
                errors.insert("email".to_string(), "email must be a valid address".to_string());
            }
        }
        if let Some(nim) = non_blank(&request.nim) {
            if self.nim_taken(&nim).await? {
                errors.insert("nim".to_string(), format!("nim {} is already registered", nim));
            }
        }
        if !errors.is_empty() {
            return Err(ServiceError::invalid_fields(errors));
        }

        insert_optional(&mut record, "angkatan", request.angkatan.map(|v| json!(v)));
        insert_optional(&mut record, "tahun_lulus", request.tahun_lulus.map(|v| json!(v)));
        insert_optional(&mut record, "no_telepon", non_blank(&request.no_telepon).map(Value::String));
        insert_optional(&mut record, "alamat", non_blank(&request.alamat).map(Value::String));

        decode(self.lifecycle.create(identity, record).await?)
    }

    pub async fn update(&self, identity: &Identity, id: i64, request: UpdateAlumniRequest) -> ServiceResult<Alumni> {
        let mut errors = HashMap::new();
        let mut patch = Document::new();
        for (field, value) in [("nama", &request.nama), ("jurusan", &request.jurusan), ("email", &request.email)] {
            if value.is_none() {
                continue;
            }
            match non_blank(value) {
                Some(text) => {
                    patch.insert(field.to_string(), json!(text));
                }
                None => {
                    errors.insert(field.to_string(), format!("{} cannot be empty", field));
                }
            }
        }
        if let Some(Value::String(email)) = patch.get("email") {
            if !email.contains('@') {
                errors.insert("email".to_string(), "email must be a valid address".to_string());
            }
        }
        if !errors.is_empty() {
            return Err(ServiceError::invalid_fields(errors));
        }
        insert_optional(&mut patch, "angkatan", request.angkatan.map(|v| json!(v)));
        insert_optional(&mut patch, "tahun_lulus", request.tahun_lulus.map(|v| json!(v)));
        // Blank optional text clears the stored value
        if request.no_telepon.is_some() {
            patch.insert("no_telepon".to_string(), non_blank(&request.no_telepon).map(Value::String).unwrap_or(Value::Null));
        }
        if request.alamat.is_some() {
            patch.insert("alamat".to_string(), non_blank(&request.alamat).map(Value::String).unwrap_or(Value::Null));
        }

        decode(self.lifecycle.update(identity, id, patch).await?)
    }

    pub async fn soft_delete(&self, identity: &Identity, id: i64) -> ServiceResult<()> {
        self.lifecycle.soft_delete(identity, id).await
    }

    pub async fn restore(&self, identity: &Identity, id: i64) -> ServiceResult<Alumni> {
        decode(self.lifecycle.restore(identity, id).await?)
    }

    /// NIM is unique across every alumni, trashed ones included.
    async fn nim_taken(&self, nim: &str) -> ServiceResult<bool> {
        Ok(self.lifecycle.store().count(Collection::Alumni, &json!({ "nim": nim })).await? > 0)
    }

    /// Whether an active alumni with this id exists, regardless of owner.
    pub(crate) async fn exists_active(&self, id: i64) -> ServiceResult<bool> {
        let filter = crate::store::and_filters([json!({ "id": id }), RecordState::Active.predicate()]);
        Ok(self.lifecycle.store().count(Collection::Alumni, &filter).await? > 0)
    }
}

fn insert_optional(doc: &mut Document, field: &str, value: Option<Value>) {
    if let Some(value) = value {
        doc.insert(field.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{memory_store, user};

    fn request(nim: &str, nama: &str) -> CreateAlumniRequest {
        CreateAlumniRequest {
            nim: Some(nim.to_string()),
            nama: Some(nama.to_string()),
            jurusan: Some("Teknik Informatika".to_string()),
            email: Some(format!("{}@example.com", nim)),
            angkatan: Some(2018),
            ..Default::default()
        }
    }

    fn service() -> AlumniService {
        AlumniService::new(memory_store(), DenialPolicy::NotFound)
    }

    #[tokio::test]
    async fn create_reports_missing_fields() {
        let err = service().create(&user(2), CreateAlumniRequest::default()).await.unwrap_err();
        match err {
            ServiceError::Validation { field_errors: Some(fields), .. } => {
                for field in ["nim", "nama", "jurusan", "email"] {
                    assert!(fields.contains_key(field), "missing {}", field);
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn duplicate_nim_is_a_field_error() {
        let svc = service();
        let first = svc.create(&user(2), request("2017001", "Siti")).await.unwrap();
        svc.soft_delete(&user(2), first.id).await.unwrap();

        // Trashed alumni still hold their NIM, whoever asks
        let err = svc.create(&user(3), request("2017001", "Sari")).await.unwrap_err();
        match err {
            ServiceError::Validation { field_errors: Some(fields), .. } => assert!(fields.contains_key("nim")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn update_reports_blank_fields_per_field() {
        let svc = service();
        let created = svc.create(&user(2), request("2101", "Budi")).await.unwrap();
        let err = svc
            .update(
                &user(2),
                created.id,
                UpdateAlumniRequest { nama: Some("  ".to_string()), email: Some("budi".to_string()), ..Default::default() },
            )
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation { field_errors: Some(fields), .. } => {
                assert!(fields.contains_key("nama"));
                assert!(fields.contains_key("email"));
                assert!(!fields.contains_key("jurusan"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn update_merges_and_clears_optional_text() {
        let svc = service();
        let mut req = request("2101", "Budi");
        req.alamat = Some("Jl. Merdeka 1".to_string());
        let created = svc.create(&user(2), req).await.unwrap();

        let updated = svc
            .update(
                &user(2),
                created.id,
                UpdateAlumniRequest { nama: Some("Budi Santoso".to_string()), alamat: Some(String::new()), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(updated.nama, "Budi Santoso");
        assert_eq!(updated.jurusan, "Teknik Informatika");
        assert_eq!(updated.alamat, None);
    }

    #[tokio::test]
    async fn list_searches_and_pages() {
        let svc = service();
        for (nim, nama) in [("1", "Andi"), ("2", "Budi"), ("3", "Candra")] {
            svc.create(&user(2), request(nim, nama)).await.unwrap();
        }
        let params = ListParams { search: Some("budi".to_string()), ..Default::default() };
        let (rows, meta) = svc.list(&user(2), &params).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(meta.total, 1);

        let params = ListParams { limit: Some("2".to_string()), page: Some("2".to_string()), ..Default::default() };
        let (rows, meta) = svc.list(&user(2), &params).await.unwrap();
        assert_eq!(rows.iter().map(|a| a.nama.as_str()).collect::<Vec<_>>(), vec!["Candra"]);
        assert_eq!(meta.pages, 2);
    }

    #[tokio::test]
    async fn trash_lists_deleted_only() {
        let svc = service();
        let a = svc.create(&user(2), request("1", "Andi")).await.unwrap();
        svc.create(&user(2), request("2", "Budi")).await.unwrap();
        svc.soft_delete(&user(2), a.id).await.unwrap();

        let trash = svc.list_trash(&user(2)).await.unwrap();
        assert_eq!(trash.len(), 1);
        assert!(trash[0].deleted_at.is_some());
        assert!(!svc.exists_active(a.id).await.unwrap());
    }
}
