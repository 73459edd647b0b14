// src/services/mod.rs

pub mod guard;
pub mod needs;
pub mod queries;
