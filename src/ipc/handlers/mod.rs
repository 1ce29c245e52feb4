pub mod core;
pub mod import;
pub mod library;
