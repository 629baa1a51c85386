//! Review Scout server: HTTP routes, widget store, and configuration.

pub mod config;
pub mod error;
pub mod rest;
pub mod widgets;
