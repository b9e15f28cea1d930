use std::sync::Once;

static INIT: Once = Once::new();

/// Installs a warn-level subscriber once per test binary.
/// `RUST_LOG` overrides the level when set.
pub fn init_test_env() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
