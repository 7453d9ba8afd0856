pub mod bookmark;
pub mod change;
