//! Agora Server
//!
//! Authorization core for a multi-tenant community backend: decides, before
//! any write, whether a principal may run a mutation and which of its
//! arguments it may set.

pub mod api;
pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod operations;
