// src/models/mod.rs

pub mod category;
pub mod exam_mode;
pub mod question;
pub mod score;
pub mod user;
