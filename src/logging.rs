use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive; wins over `-v`/`-q`.
pub const LOG_ENV: &str = "INDEXER_LOG";

fn default_directive(verbosity: i8) -> &'static str {
    match verbosity {
        i8::MIN..=-2 => "error",
        -1 => "warn",
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays free for
/// command output.
pub fn init(verbosity: i8, json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(-3, "error")]
    #[case(-1, "warn")]
    #[case(0, "info")]
    #[case(1, "debug")]
    #[case(4, "trace")]
    fn test_default_directive(#[case] verbosity: i8, #[case] expected: &str) {
        assert_eq!(default_directive(verbosity), expected);
    }
}
