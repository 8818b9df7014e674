use std::sync::Arc;

use clap::Parser;
use transit_route_engine::server::start_server;
use transit_route_engine::store::postgis::PostgisStore;
use transit_route_engine::EngineConfig;

/// Multi-modal transit route planning engine
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// PostGIS connection string (libpq format)
    #[clap(long, env = "DATABASE_URL")]
    database_url: String,

    /// Server host address
    #[clap(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[clap(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let store = PostgisStore::connect(&args.database_url)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to PostGIS store: {e}"));

    start_server(Arc::new(store), EngineConfig::default(), &args.host, args.port).await
}
