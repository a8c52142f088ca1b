//! Configuration builders for tests.

use udpq_config::ServerConfig;

/// Fluent builder for [`ServerConfig`] in tests.
///
/// Defaults to `127.0.0.1` and port 0, so every test server gets its own
/// ephemeral port.
///
/// ```ignore
/// let config = TestConfigBuilder::new().delay_secs(1).build();
/// ```
pub struct TestConfigBuilder {
    config: ServerConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let mut config = ServerConfig::default();
        config.server.bind_addr = "127.0.0.1".to_string();
        config.server.port = 0;
        Self { config }
    }

    pub fn delay_secs(mut self, secs: u64) -> Self {
        self.config.server.delay_secs = secs;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
