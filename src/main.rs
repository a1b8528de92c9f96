use dnsdeps::app::App;
use dnsdeps::cli::Cli;
use dnsdeps::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::from_args();
    logging::init(cli.verbose);

    if let Err(e) = App::run(&cli).await {
        if cli.error_enabled() {
            eprintln!("Error ({}): {e}", e.category());
        }
        std::process::exit(1);
    }
}
