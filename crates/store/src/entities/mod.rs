pub mod contract;
pub mod edge;
pub mod source_file;
pub mod type_def;
