// Logging setup for binaries, demos and tests that want readable output
//
// The library itself only emits `tracing` events; installing a subscriber
// is left to whoever owns the process.

/// Install the default fmt subscriber (INFO and above to stdout)
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    if tracing_subscriber::fmt().try_init().is_err() {
        tracing::trace!("Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
    }
}
