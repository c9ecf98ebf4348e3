pub mod admin;
pub mod path;
