pub mod a001_book;
pub mod common;
