// /api/alumni - alumni CRUD with soft delete and restore
pub mod collection;
pub mod record;

pub use collection::{alumni_create, alumni_list, alumni_trash};
pub use record::{alumni_delete, alumni_get, alumni_restore, alumni_update};
