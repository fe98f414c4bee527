use std::fmt;

/// Storage-level type of a column, used to cast parameters and convert values
/// between the JSON wire form and each backend's native representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Text,
    /// Calendar date, `YYYY-MM-DD` on the wire
    Date,
    /// RFC 3339 instant on the wire
    Timestamp,
}

impl FieldKind {
    pub fn sql_cast(&self) -> Option<&'static str> {
        match self {
            FieldKind::Date => Some("DATE"),
            FieldKind::Timestamp => Some("TIMESTAMPTZ"),
            FieldKind::Int | FieldKind::Text => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Alumni,
    Pekerjaan,
}

const USER_FIELDS: &[(&str, FieldKind)] = &[
    ("id", FieldKind::Int),
    ("username", FieldKind::Text),
    ("email", FieldKind::Text),
    ("password_hash", FieldKind::Text),
    ("role", FieldKind::Text),
    ("created_at", FieldKind::Timestamp),
];

const ALUMNI_FIELDS: &[(&str, FieldKind)] = &[
    ("id", FieldKind::Int),
    ("nim", FieldKind::Text),
    ("nama", FieldKind::Text),
    ("jurusan", FieldKind::Text),
    ("angkatan", FieldKind::Int),
    ("tahun_lulus", FieldKind::Int),
    ("email", FieldKind::Text),
    ("no_telepon", FieldKind::Text),
    ("alamat", FieldKind::Text),
    ("created_by", FieldKind::Int),
    ("created_at", FieldKind::Timestamp),
    ("updated_at", FieldKind::Timestamp),
    ("deleted_at", FieldKind::Timestamp),
];

const PEKERJAAN_FIELDS: &[(&str, FieldKind)] = &[
    ("id", FieldKind::Int),
    ("alumni_id", FieldKind::Int),
    ("nama_perusahaan", FieldKind::Text),
    ("posisi_jabatan", FieldKind::Text),
    ("bidang_industri", FieldKind::Text),
    ("lokasi_kerja", FieldKind::Text),
    ("gaji_range", FieldKind::Text),
    ("tanggal_mulai_kerja", FieldKind::Date),
    ("tanggal_selesai_kerja", FieldKind::Date),
    ("status_pekerjaan", FieldKind::Text),
    ("deskripsi_pekerjaan", FieldKind::Text),
    ("created_by", FieldKind::Int),
    ("created_at", FieldKind::Timestamp),
    ("updated_at", FieldKind::Timestamp),
    ("deleted_at", FieldKind::Timestamp),
];

impl Collection {
    /// Table name in PostgreSQL, collection name in MongoDB
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Alumni => "alumni",
            Collection::Pekerjaan => "pekerjaan_alumni",
        }
    }

    /// Sequence key in the `counters` collection of the document backend
    pub fn counter_name(&self) -> &'static str {
        match self {
            Collection::Users => "users_id",
            Collection::Alumni => "alumni_id",
            Collection::Pekerjaan => "pekerjaan_id",
        }
    }

    pub fn fields(&self) -> &'static [(&'static str, FieldKind)] {
        match self {
            Collection::Users => USER_FIELDS,
            Collection::Alumni => ALUMNI_FIELDS,
            Collection::Pekerjaan => PEKERJAAN_FIELDS,
        }
    }

    pub fn field_kind(&self, name: &str) -> Option<FieldKind> {
        self.fields()
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, kind)| *kind)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> {
        self.fields().iter().map(|(name, _)| *name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_column_present_on_owned_collections() {
        assert_eq!(Collection::Alumni.field_kind("deleted_at"), Some(FieldKind::Timestamp));
        assert_eq!(Collection::Pekerjaan.field_kind("deleted_at"), Some(FieldKind::Timestamp));
        assert_eq!(Collection::Users.field_kind("deleted_at"), None);
    }

    #[test]
    fn job_dates_are_calendar_dates() {
        assert_eq!(Collection::Pekerjaan.field_kind("tanggal_mulai_kerja"), Some(FieldKind::Date));
        assert_eq!(FieldKind::Date.sql_cast(), Some("DATE"));
        assert_eq!(FieldKind::Int.sql_cast(), None);
    }
}
