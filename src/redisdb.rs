use redis::{AsyncCommands, aio::ConnectionManager};
use std::net::IpAddr;

#[derive(Clone)]
pub struct RedisClient {
    pub conn: ConnectionManager,
}

impl RedisClient {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn save_refresh_token(
        &self,
        user_id: &str,
        refresh_token: &str,
        expires_in_seconds: i64,
    ) -> redis::RedisResult<()> {
        let key = format!("refresh:{}", user_id);
        let mut conn = self.conn.clone(); // ConnectionManager cloning is cheap
        conn.set_ex(key, refresh_token, expires_in_seconds as u64)
            .await
    }

    pub async fn get_refresh_token(&self, user_id: &str) -> redis::RedisResult<Option<String>> {
        let key = format!("refresh:{}", user_id);
        let mut conn = self.conn.clone();
        conn.get(key).await
    }

    pub async fn delete_refresh_token(&self, user_id: &str) -> redis::RedisResult<()> {
        let key = format!("refresh:{}", user_id);
        let mut conn = self.conn.clone();
        conn.del(key).await
    }

    // Login rate limiting: one counter per IP (24h window) and one per
    // identifier+IP pair (1h window). Counters expire on their own; a
    // successful login clears the pair counter.

    pub async fn get_ip_attempts(&self, ip: IpAddr) -> redis::RedisResult<Option<u32>> {
        let key = format!("login_attempts:ip:{}", ip);
        let mut conn = self.conn.clone();
        conn.get(key).await
    }

    pub async fn get_identifier_ip_attempts(
        &self,
        ip: IpAddr,
        identifier: &str,
    ) -> redis::RedisResult<Option<u32>> {
        let key = format!("login_attempts:id:{}:{}", identifier, ip);
        let mut conn = self.conn.clone();
        conn.get(key).await
    }

    pub async fn increment_attempts(
        &self,
        ip: IpAddr,
        identifier: &str,
    ) -> redis::RedisResult<()> {
        let ip_key = format!("login_attempts:ip:{}", ip);
        let pair_key = format!("login_attempts:id:{}:{}", identifier, ip);
        let mut conn = self.conn.clone();

        let _: i64 = conn.incr(&ip_key, 1).await?;
        let _: bool = conn.expire(&ip_key, 24 * 60 * 60).await?;
        let _: i64 = conn.incr(&pair_key, 1).await?;
        let _: bool = conn.expire(&pair_key, 60 * 60).await?;

        Ok(())
    }

    pub async fn delete_identifier_ip_attempts(
        &self,
        ip: IpAddr,
        identifier: &str,
    ) -> redis::RedisResult<()> {
        let key = format!("login_attempts:id:{}:{}", identifier, ip);
        let mut conn = self.conn.clone();
        conn.del(key).await
    }
}
