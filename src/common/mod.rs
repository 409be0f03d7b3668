//! Shared plumbing used by embedding applications.

pub mod logger;
