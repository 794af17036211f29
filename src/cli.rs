use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "dns-lookup")]
#[command(about = "Send a single A-record query over UDP and print the decoded response", long_about = None)]
pub struct Args {
    /// Domain name to query
    pub domain: String,

    #[arg(short, long, default_value = "8.8.8.8")]
    pub server: String,

    #[arg(short, long, default_value_t = 53)]
    pub port: u16,

    /// Receive deadline in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,

    /// Use a random transaction id instead of the fixed one
    #[arg(long)]
    pub random_id: bool,

    #[arg(short, long, default_value = "warn")]
    pub log_level: String,
}
