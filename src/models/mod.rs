// src/models/mod.rs

pub mod need;
pub mod user;
pub mod volunteer;
