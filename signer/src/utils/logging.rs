use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("debug")
            .add_directive(
                "reqwest=info"
                    .parse()
                    .expect("assert: can parse env filter directive"),
            )
            .add_directive(
                "hyper=info"
                    .parse()
                    .expect("assert: can parse env filter directive"),
            )
            .add_directive(
                "hyper_util=info"
                    .parse()
                    .expect("assert: can parse env filter directive"),
            )
            .add_directive(
                "rustls=info"
                    .parse()
                    .expect("assert: can parse env filter directive"),
            )
    });

    let standard_format = fmt::format()
        .with_timer(fmt::time::time())
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false);

    // Everything goes to stderr; stdout is reserved for --print-public-key
    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::Layer::default()
            .with_writer(std::io::stderr)
            .event_format(standard_format),
    );

    subscriber.init();
}
