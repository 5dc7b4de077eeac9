use tracing_subscriber::{filter::Directive, EnvFilter};

/// Human-readable logs on stderr; stdout stays free for reports.
///
/// `RUST_LOG` adds to the default `powermind_service=info` directive.
pub fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "powermind_service=info".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
