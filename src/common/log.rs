use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_tree::HierarchicalLayer;
use tracing_tree::time::Uptime;

/// Installs the global subscriber: `RUST_LOG` filtering (default `info`) and
/// an indented span tree on stderr.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let tree = HierarchicalLayer::default()
        .with_writer(std::io::stderr)
        .with_indent_lines(true)
        .with_targets(true)
        .with_timer(Uptime::default());

    if let Err(e) = tracing_subscriber::registry().with(filter).with(tree).try_init() {
        eprintln!("Could not install tracing subscriber: {e}");
    }
}
