use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dehash")]
#[command(about = "Resolve hash digests to plaintexts through a lookup service")]
#[command(version)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Suppress progress output (fatal errors are still printed)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify a lookup table against a wordlist
    Verify(VerifyArgs),

    /// Resolve every unresolved record in a document store
    Bulk(BulkArgs),
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Wordlist file, one candidate per line
    pub wordlist: PathBuf,

    /// Hash algorithm used by the lookup table (md5, sha1, sha256)
    pub algorithm: String,

    /// Lookup service address (host:port)
    pub lookup: String,
}

#[derive(Args, Debug, Clone)]
pub struct BulkArgs {
    /// Document store URL (e.g. http://localhost:9200)
    pub store_url: String,

    /// Collection (index) holding the records
    pub collection: String,

    /// Lookup service address (host:port)
    pub lookup: String,

    /// Maximum number of records fetched per batch
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Exit once no unresolved records can be processed
    #[arg(long)]
    pub stop_when_drained: bool,

    /// Field holding the digest
    #[arg(long)]
    pub digest_field: Option<String>,

    /// Field the recovered plaintext is written to
    #[arg(long)]
    pub plaintext_field: Option<String>,
}
