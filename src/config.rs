use anyhow::Context;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from the environment. `.env` is loaded by the caller.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("SERVER_PORT")
            .ok()
            .map(|p| p.parse::<u16>())
            .transpose()
            .context("SERVER_PORT is not a valid port number")?
            .unwrap_or(8080);

        Ok(Self {
            server: ServerConfig { host, port },
            database_url,
        })
    }
}
