pub mod rate_limiter;

pub use rate_limiter::{FixedWindowLimiter, RateLimiter, RedisFixedWindowLimiter};
