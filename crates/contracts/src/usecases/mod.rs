pub mod common;
pub mod u501_batch_import_annotations;
