pub mod capture;
pub mod clear;
pub mod common;
pub mod completions;
pub mod config;
pub mod list;
pub mod report;
pub mod sync;
