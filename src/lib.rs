//! taskfs: Archive-Backed File Collections
//!
//! Stores the files of programming tasks and student answers as tar archives,
//! serves single files and directory views out of them, and builds the
//! evaluation view that hides and protects files according to task rules.

pub mod archive;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod path;
pub mod pattern;
pub mod service;
pub mod store;
pub mod task;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod view;
