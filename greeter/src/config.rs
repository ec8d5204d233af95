use clap::Parser;

pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://greetings.kylepenfound.com",
    "https://dagger-demo.netlify.app",
    "http://localhost:8081",
];

/// Service configuration, read from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "greeter", version, about = "Greeting lookup and sensor measurement API")]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "HTTP_ADDR", default_value = "0.0.0.0:8080")]
    pub http_addr: String,

    /// SQLite file holding measurements, or ":memory:"
    #[arg(long, env = "DATABASE_PATH", default_value = "./greetings.db")]
    pub database_path: String,

    /// Origins advertised in CORS responses
    #[arg(
        long,
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values = DEFAULT_ALLOWED_ORIGINS
    )]
    pub allowed_origins: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_flags() {
        let config = Config::try_parse_from([
            "greeter",
            "--http-addr",
            "127.0.0.1:9000",
            "--database-path",
            ":memory:",
            "--allowed-origins",
            "http://a.example,http://b.example",
        ])
        .unwrap();

        assert_eq!(config.http_addr, "127.0.0.1:9000");
        assert_eq!(config.database_path, ":memory:");
        assert_eq!(
            config.allowed_origins,
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );
    }

    #[test]
    fn test_default_origins() {
        let config = Config::try_parse_from(["greeter", "--http-addr", "127.0.0.1:0"]).unwrap();
        if std::env::var_os("ALLOWED_ORIGINS").is_none() {
            assert_eq!(config.allowed_origins, DEFAULT_ALLOWED_ORIGINS.to_vec());
        }
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Config::try_parse_from(["greeter", "--listen", "0.0.0.0:1"]).is_err());
    }
}
