pub mod channels;
pub mod dubbing;
pub mod enums;
pub mod jobs;
pub mod tiktok;
