pub mod a001_book;
