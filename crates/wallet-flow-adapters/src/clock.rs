use wallet_flow_core::ClockPort;

#[derive(Debug, Clone, Default)]
pub struct SystemClockAdapter;

impl ClockPort for SystemClockAdapter {
    /// Milliseconds since the Unix epoch. A clock set before the epoch reads
    /// as zero rather than failing the transition log.
    fn now_ms(&self) -> u64 {
        #[cfg(target_arch = "wasm32")]
        let since_epoch = web_time::SystemTime::now().duration_since(web_time::UNIX_EPOCH);
        #[cfg(not(target_arch = "wasm32"))]
        let since_epoch = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH);

        match since_epoch {
            Ok(now) => u64::try_from(now.as_millis()).unwrap_or(u64::MAX),
            Err(e) => {
                tracing::warn!(error = %e, "system clock before epoch");
                0
            }
        }
    }
}
