pub mod contacts;
pub mod data_sources;
pub mod logs;
pub mod merge;
pub mod templates;
