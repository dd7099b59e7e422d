// src/db/mod.rs
//
// Data access layer. Each entity gets its own module of async functions over
// a shared `SqlitePool`; multi-statement mutations run inside a transaction.

pub mod category;
pub mod dashboard;
pub mod question;
pub mod score;
pub mod user;
