mod command_result;
pub mod format;
pub mod helper;
pub mod init;
pub mod scan;
pub mod unused;

pub use command_result::*;
