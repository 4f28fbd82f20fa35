use env_logger::{Builder, Env};

fn init_logger() {
    // RUST_LOG controls verbosity; default to info.
    // Example: RUST_LOG=debug malh select foo "a,?"
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = malh::cli::run() {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
