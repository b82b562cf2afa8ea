/// Redis integration
///
/// Only used for the API's fixed-window rate limiter; the server runs
/// without it when `REDIS_URL` is unset.

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig, RedisStats};
