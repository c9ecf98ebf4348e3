pub mod flash;
pub mod http;
pub mod jwt;
pub mod qr;
