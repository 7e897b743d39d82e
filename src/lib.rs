//! Location-independent links to files in shared Dropbox folders.
//!
//! A share token names a shared folder by its namespace and a file by its
//! path inside that folder, so the same link opens the right file on every
//! machine the folder is synced to, wherever it is mounted.

pub mod app;
pub mod clipboard;
pub mod codec;
pub mod config;
pub mod folders;
pub mod logging;
pub mod paths;
pub mod platform;
