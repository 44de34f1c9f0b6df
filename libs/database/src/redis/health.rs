use redis::aio::ConnectionManager;

/// Verify the Redis connection is alive with a `PING`.
pub async fn check_redis(redis: &ConnectionManager) -> redis::RedisResult<()> {
    let mut conn = redis.clone();
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires a live Redis
    async fn ping_succeeds_against_local_redis() {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let redis = crate::redis::connect(&url).await.unwrap();
        assert!(check_redis(&redis).await.is_ok());
    }
}
