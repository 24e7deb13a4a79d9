use std::path::PathBuf;

use clap::Parser;

/// `roomcast-server` command line options.
#[derive(Debug, Parser)]
#[command(name = "roomcast-server", about = "Multi-room TCP chat server")]
pub struct ServerArgs {
    /// Address to bind and accept connections on.
    #[arg(long, default_value = "0.0.0.0:20000")]
    pub addr: String,

    /// Sensitive-word dictionary, one ASCII word per line.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// `roomcast-client` command line options.
#[derive(Debug, Parser)]
#[command(name = "roomcast-client", about = "Interactive chat client")]
pub struct ClientArgs {
    /// Address of the server to connect to.
    #[arg(long, default_value = "127.0.0.1:20000")]
    pub addr: String,
}

/// `roomcast-benchmark` command line options.
#[derive(Debug, Parser)]
#[command(name = "roomcast-benchmark", about = "Load-generating chat client")]
pub struct BenchmarkArgs {
    /// Address of the server to connect to.
    #[arg(long, default_value = "127.0.0.1:20000")]
    pub addr: String,

    /// Number of simulated clients to run concurrently.
    #[arg(long, default_value_t = 100)]
    pub num: usize,
}

/// Reads a dictionary file into a list of lowercase ASCII words, rejecting
/// any entry that contains a non-ASCII byte.
pub fn load_dictionary(path: &std::path::Path) -> Result<Vec<String>, crate::error::ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| crate::error::ConfigError::DictionaryRead {
        path: path.display().to_string(),
        source,
    })?;

    let mut words = Vec::new();
    for line in text.lines() {
        let word = line.trim();
        if word.is_empty() {
            continue;
        }
        if !word.is_ascii() {
            return Err(crate::error::ConfigError::NotAscii(word.to_string()));
        }
        words.push(word.to_string());
    }
    Ok(words)
}
