//! Utility library for the satellite network experiments: snapshot files and local file handling.

pub mod fstate;
pub mod local_shell;
pub mod other;
