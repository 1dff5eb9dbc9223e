pub mod api_utils;
pub mod export;
pub mod modal_frame;
pub mod notice;
