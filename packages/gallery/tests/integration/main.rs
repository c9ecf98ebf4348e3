mod common;
mod export;
mod upload;
