// src/models/mod.rs

pub mod candidate;
pub mod exam;
pub mod question;
pub mod result;
pub mod submission;
