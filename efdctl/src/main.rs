use clap::Parser;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = efdctl::Cli::parse();
    efdctl::init_tracing(cli.debug);
    match efdctl::run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
