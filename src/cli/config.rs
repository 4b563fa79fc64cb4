use secrecy::SecretString;

/// Minimum accepted length, in bytes, of the flash-cookie signing key.
pub const MIN_SECRET_KEY_LEN: usize = 16;

/// Process configuration, built once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub dsn: String,
    pub max_connections: u32,
    pub secret_key: SecretString,
    pub secure_cookies: bool,
}

impl GatewayConfig {
    #[must_use]
    pub fn new(dsn: String, secret_key: SecretString) -> Self {
        Self {
            port: 8080,
            dsn,
            max_connections: 5,
            secret_key,
            secure_cookies: false,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure_cookies: bool) -> Self {
        self.secure_cookies = secure_cookies;
        self
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("port", &self.port)
            .field("dsn", &self.dsn)
            .field("max_connections", &self.max_connections)
            .field("secret_key", &"***")
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}
