pub mod serve;
pub mod verify;
