use std::time::Duration;

/// Tuning knobs for a `SessionRegistry` and its sweeper
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// TTL used when the caller does not ask for one
    pub default_ttl: Duration,
    /// Upper bound accepted by `create`
    pub max_ttl: Duration,
    /// Period of the background sweep
    pub sweep_interval: Duration,
    /// Max deletions per lock acquisition during a sweep
    pub sweep_batch_size: usize,
    /// Id generation attempts before `AllocationExhausted`
    pub id_retry_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(120),
            max_ttl: Duration::from_secs(15 * 60),
            sweep_interval: Duration::from_secs(60),
            sweep_batch_size: 256,
            id_retry_limit: 5,
        }
    }
}
