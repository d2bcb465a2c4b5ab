// src/models/mod.rs

pub mod question;
pub mod quiz;
pub mod test_result;
pub mod user;
