//! Cycle management
//!
//! This module handles the invocation event, the runner's context, the
//! continuation handler and its configuration.

pub mod config;
pub mod context;
pub mod event;
pub mod handler;
