// src/repositories/mod.rs

pub mod quizzes;
pub mod results;
