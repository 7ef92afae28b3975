pub mod backend;
pub mod chat;
