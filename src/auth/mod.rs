pub mod action_token;
pub mod password;
pub mod rate_limit;
pub mod strategy;
pub mod token_store;

pub use password::{hash_password, verify_and_update, verify_password};
pub use rate_limit::{RateLimit, RateLimiter};
pub use strategy::DatabaseStrategy;
pub use token_store::{generate_token, AccessTokenStore};
