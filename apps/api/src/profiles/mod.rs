// Tenant directory: companies, candidates and jobs that feed the matcher.
// All reads and writes are scoped by the caller's client_id.

pub mod handlers;
pub mod repository;
pub mod validation;
