pub mod config;

use std::sync::Arc;

pub use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{
    filter::Filtered, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use self::config::LogConfig;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();

/// `RUST_LOG` wins over the configured level; an unparsable level means `info`.
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn console_layer(level: &str) -> Filtered<BoxedLayer, EnvFilter, Registry> {
    let layer: BoxedLayer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .boxed();
    layer.with_filter(filter(level))
}

/// JSON lines appended to `path`.
fn file_layer(path: &str, level: &str) -> std::io::Result<Filtered<BoxedLayer, EnvFilter, Registry>> {
    let file = Arc::new(
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?,
    );
    let layer: BoxedLayer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(file)
        .boxed();
    Ok(layer.with_filter(filter(level)))
}

impl LogConfig {
    /// Install the global subscriber. Only the first call has any effect.
    pub fn init(&self) {
        INIT_ONCE.call_once(|| {
            let console = console_layer(&self.console_level);
            let file = self.file.as_deref().map(|path| (path, file_layer(path, &self.file_level)));
            match file {
                Some((_, Ok(file))) => tracing_subscriber::registry().with(vec![console, file]).init(),
                Some((path, Err(err))) => {
                    tracing_subscriber::registry().with(console).init();
                    warn!(path, err = %err, "cannot open log file, logging to console only");
                }
                None => tracing_subscriber::registry().with(console).init(),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_file_log_respects_level() {
        let log_file = NamedTempFile::new().unwrap();
        let cfg = LogConfig {
            console_level: "warn".to_string(),
            file_level: "info".to_string(),
            file: Some(log_file.path().to_str().unwrap().to_string()),
        };
        cfg.init();
        info!(address = "0xabc", "probe finished");
        debug!("too verbose");
        let mut log_content = String::new();
        log_file
            .reopen()
            .unwrap()
            .read_to_string(&mut log_content)
            .unwrap();
        assert!(log_content.contains("probe finished"));
        assert!(log_content.contains("0xabc"));
        assert!(!log_content.contains("too verbose"));
    }
}
