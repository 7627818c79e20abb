pub mod read;
pub mod storage;
pub mod write;
