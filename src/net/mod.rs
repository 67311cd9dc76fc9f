pub mod protocol;
pub mod server;
pub mod worker;
pub mod ws;
