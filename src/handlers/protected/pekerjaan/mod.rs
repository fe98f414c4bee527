// /api/pekerjaan - job history CRUD with trash, restore and purge
pub mod collection;
pub mod record;

pub use collection::{pekerjaan_by_alumni, pekerjaan_create, pekerjaan_list, pekerjaan_paginated, pekerjaan_trash};
pub use record::{pekerjaan_delete, pekerjaan_get, pekerjaan_hard_delete, pekerjaan_restore, pekerjaan_update};
