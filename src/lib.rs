pub mod common;
pub mod config;
pub mod service;
pub mod storage;
pub mod ui;
