pub mod analyze;
pub mod compare;
pub mod init;
pub mod rank;
pub mod trends;
pub mod validate;
