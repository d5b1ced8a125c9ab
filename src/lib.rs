// src/lib.rs

pub mod api;

// Authentication module
pub mod auth;
