use clap::Parser;
use tracing::error;
use viralpost::config::{PublicPaths, setup_logging};
use viralpost::overlay::Compositor;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = viralpost::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let paths = PublicPaths::new(&cli.public_dir);
    if let Err(err) = viralpost::bootstrap::ensure_public_layout(&paths, Some(&cli.sample_image)) {
        error!("Startup error: {:#}", err);
        return;
    }

    let compositor = Compositor::with_system_fonts(paths);

    if let Err(err) =
        viralpost::web::setup_server(&cli.listen_address, cli.port, compositor).await
    {
        error!("Application error: {}", err);
    }
}
