pub mod current_user;
pub mod pagination;

pub use current_user::{token_from, CurrentUser, Superuser};
pub use pagination::Pagination;
