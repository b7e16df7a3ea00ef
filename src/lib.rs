//! ToolHub - a directory and review site for AI tools
//!
//! This library provides the storage, services and HTTP layer behind the
//! `toolhub` server binary.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod theme;
