//! API route modules.

pub mod accounts;
pub mod meetings;
