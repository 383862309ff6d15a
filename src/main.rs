use dynamo_seed::cli::{self, Args};
use std::process;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn init_tracing(args: &Args) {
    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

#[tokio::main]
async fn main() {
    let code = cli::main_with(std::env::args_os(), init_tracing, cli::connect_dynamodb).await;
    process::exit(code);
}
