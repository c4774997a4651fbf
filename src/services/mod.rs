// src/services/mod.rs

pub mod certificate;
pub mod scoring;
pub mod submission;
