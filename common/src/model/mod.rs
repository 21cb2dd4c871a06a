pub mod datasource;
pub mod log;
pub mod merge;
pub mod place_holder;
pub mod template;
