use clap::Parser;
use tracing::{error, info};

use roomcast::config::{load_dictionary, ServerArgs};
use roomcast::filter::Filter;
use roomcast::server::Server;

#[tokio::main]
async fn main() {
    roomcast::init_tracing();
    let args = ServerArgs::parse();

    let words = match &args.config {
        Some(path) => match load_dictionary(path) {
            Ok(words) => words,
            Err(e) => {
                error!(error = %e, "failed to load dictionary");
                std::process::exit(1);
            }
        },
        None => Vec::new(),
    };

    let filter = match Filter::build(words, true) {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, "failed to build sensitive-word filter");
            std::process::exit(1);
        }
    };

    info!(addr = %args.addr, "roomcast server starting");
    let server = Server::new(filter);
    if let Err(e) = server.run(&args.addr).await {
        error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
