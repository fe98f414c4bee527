// handlers/mod.rs - two security tiers
//
// Public (no auth): service info, health, login
// Protected (JWT auth): alumni, pekerjaan and the joined reports under /api
pub mod protected;
pub mod public;
