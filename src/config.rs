use clap::Parser;
use std::net::SocketAddr;

/// Settings for the web server
///
/// Every flag can also be supplied through its `SWEEPER_*` environment
/// variable.
#[derive(Parser, Clone, Debug)]
#[command(name = "data-sweeper", version, about = "Convert CSV and Excel files in the browser")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "SWEEPER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "SWEEPER_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Largest accepted request body, in megabytes
    #[arg(long, env = "SWEEPER_MAX_UPLOAD_MB", default_value_t = 200)]
    pub max_upload_mb: usize,

    /// Rows returned in a preview
    #[arg(long, env = "SWEEPER_PREVIEW_ROWS", default_value_t = 5)]
    pub preview_rows: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_upload_mb: 200,
            preview_rows: 5,
        }
    }
}

impl ServerConfig {
    /// Socket address built from host and port
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config =
            ServerConfig::try_parse_from(["data-sweeper", "--port", "8080", "--preview-rows", "10"])
                .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.preview_rows, 10);
        assert_eq!(config.max_upload_bytes(), 200 * 1024 * 1024);
    }

    #[test]
    fn addr_combines_host_and_port() {
        let config = ServerConfig::default();
        assert_eq!(config.addr().unwrap().to_string(), "127.0.0.1:3000");
    }
}
