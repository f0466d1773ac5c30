//! Command implementations that work outside an opened [`App`](crate::app::App).

pub mod init;
