pub mod analytics;
pub mod common;
pub mod config;
pub mod web;
