//! Data models for the catalog

pub mod author;
pub mod book;
pub mod category;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorOutput};
pub use book::{Book, BookOutput};
pub use category::Category;
pub use user::{Account, AccountClaims, AccountPublic};
