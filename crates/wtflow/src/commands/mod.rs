pub mod cleanup;
pub mod create;
pub mod dev;
pub mod env;
pub mod init;
pub mod list;
pub mod logs;
pub mod remove;
pub mod status;
pub mod stop;
