pub mod config;
pub mod counter;
pub mod pixel;
pub mod storage;
