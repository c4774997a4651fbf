// src/handlers/mod.rs

pub mod admin;
pub mod candidate;
pub mod exam;
pub mod result;
