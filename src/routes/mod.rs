pub mod bookmarks;
pub mod feed;
