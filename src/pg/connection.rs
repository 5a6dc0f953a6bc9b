use crate::util::{sanitize_url, Result, SchemaError};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres, Row};

/// A single database session. Catalog queries and apply-mode execution all
/// run on this one pool, sized at one connection so statements serialize.
pub struct PgConnection {
    pool: Pool<Postgres>,
    version_num: i32,
}

impl PgConnection {
    /// Connects and captures the server version. Versions before 9.4 are
    /// rejected.
    pub async fn connect(options: PgConnectOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| SchemaError::Connection(e.to_string()))?;

        let row = sqlx::query("SHOW server_version_num")
            .fetch_one(&pool)
            .await
            .map_err(|e| SchemaError::Connection(format!("cannot read server version: {e}")))?;
        let version_text: String = row.get(0);
        let version_num: i32 = version_text
            .parse()
            .map_err(|_| SchemaError::Connection(format!("bad server version: {version_text}")))?;

        if version_num < 90400 {
            return Err(SchemaError::UnsupportedVersion(version_text));
        }

        Ok(PgConnection { pool, version_num })
    }

    pub async fn connect_url(url: &str) -> Result<Self> {
        let options: PgConnectOptions = url.parse().map_err(|e| {
            SchemaError::Connection(format!("invalid connection URL {}: {e}", sanitize_url(url)))
        })?;
        Self::connect(options).await
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    /// `server_version_num`, e.g. 150002.
    pub fn version_num(&self) -> i32 {
        self.version_num
    }

    /// Major version number (9 for any 9.x release).
    pub fn major_version(&self) -> i32 {
        self.version_num / 10000
    }
}
