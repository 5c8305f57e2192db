//! Request types for the backend's v0 REST surface.

pub mod auth;
pub mod bucket;
pub mod file;
pub mod provider;
