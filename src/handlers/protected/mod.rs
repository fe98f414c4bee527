// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here runs behind `jwt_auth_middleware`, which injects the
// caller's `Identity` as a request extension.
pub mod alumni;
pub mod alumni_pekerjaan;
pub mod pekerjaan;
pub mod utils;
