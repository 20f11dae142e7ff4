// src/collector/config.rs

use crate::observation::CodecConfig;

/// Settings for a [`GhsCollector`](super::GhsCollector).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct CollectorConfig {
    pub codec: CodecConfig,
    /// Append an E2E-CRC to every RACP command written.
    pub racp_e2e_crc: bool,
}

impl CollectorConfig {
    #[must_use]
    pub fn with_codec(mut self, codec: CodecConfig) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn with_racp_e2e_crc(mut self, enabled: bool) -> Self {
        self.racp_e2e_crc = enabled;
        self
    }
}
