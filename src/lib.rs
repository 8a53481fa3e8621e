pub mod app;
pub mod assemble;
pub mod assets;
pub mod config;
pub mod console;
pub mod domain;
pub mod error;
pub mod file_set;
pub mod git;
pub mod metadata;
pub mod output;
pub mod snip;
pub mod store;
pub mod template;
