pub mod error;
pub mod pipeline;
pub mod rest;
pub mod static_files;
