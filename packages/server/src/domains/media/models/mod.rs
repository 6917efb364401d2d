pub mod report_media;

pub use report_media::*;
