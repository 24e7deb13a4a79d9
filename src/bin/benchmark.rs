use clap::Parser;
use tracing::error;

use roomcast::config::BenchmarkArgs;

#[tokio::main]
async fn main() {
    roomcast::init_tracing();
    let args = BenchmarkArgs::parse();

    if let Err(e) = roomcast::bench::run(args).await {
        error!(error = %e, "benchmark exited with error");
        std::process::exit(1);
    }
}
