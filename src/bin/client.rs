use clap::Parser;
use tracing::error;

use roomcast::config::ClientArgs;

#[tokio::main]
async fn main() {
    roomcast::init_tracing();
    let args = ClientArgs::parse();

    if let Err(e) = roomcast::client_app::run(args).await {
        error!(error = %e, "client exited with error");
        std::process::exit(1);
    }
}
