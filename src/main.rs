//! # Static Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada: carga la configuración, instala el logger y las
//! señales de apagado, y corre el servidor hasta recibir SIGINT/SIGTERM.

use env_logger::Env;
use static_server::config::Config;
use static_server::server::Server;
use static_server::shutdown::Shutdown;
use static_server::ServerError;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> static_server::Result<()> {
    let config = Config::load()?;
    config.validate().map_err(ServerError::Config)?;
    config.print_summary();

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            log::info!("Shutdown signal received");
            shutdown.trigger();
        })
        .map_err(|e| ServerError::Config(format!("cannot install signal handler: {}", e)))?;
    }

    let server = Server::new(config)?;
    server.serve(&shutdown)?;

    log::info!("Server stopped");
    Ok(())
}
