// src/handlers/mod.rs

pub mod auth;
pub mod dashboard;
pub mod meta;
pub mod needs;
