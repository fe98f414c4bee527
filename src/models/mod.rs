pub mod alumni;
pub mod pekerjaan;
pub mod report;
pub mod user;

pub use alumni::{Alumni, CreateAlumniRequest, UpdateAlumniRequest};
pub use pekerjaan::{CreatePekerjaanRequest, Pekerjaan, UpdatePekerjaanRequest};
pub use report::{AlumniJobReport, AlumniWithPekerjaan};
pub use user::{LoginRequest, LoginResponse, User, UserProfile};
