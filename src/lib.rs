// src/lib.rs

pub mod analysis;
pub mod config;
pub mod exchange;
pub mod logger;
pub mod models;
pub mod relay;
pub mod storage;
