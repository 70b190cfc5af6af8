use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = servergate::cli::Cli::parse();
    if let Err(e) = servergate::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
