pub mod assets;
pub mod genre;
pub mod movie;
pub mod pages;
