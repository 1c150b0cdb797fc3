//! Infrastructure layer: persistence and outbound email

pub mod database;
pub mod email;
pub mod storage;
