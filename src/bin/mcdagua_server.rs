//! McDagua dashboard API server binary

use clap::Parser;
use mcdagua_dash::api::{run_api_server, ApiConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mcdagua-server")]
#[command(version)]
#[command(about = "McDagua Dashboard API - chart series and datasets over HTTP")]
#[command(long_about = r#"
McDagua Dashboard API

Endpoints:
  - GET  /api/graficos-data  - Chart series of the general workbook
  - GET  /api/haccp-graficos - Chart series of the HACCP workbook
  - GET  /api/:kind          - Filtered dataset + filter options + KPIs
  - GET  /download/:kind     - Filtered dataset as .xlsx
  - POST /upload/:kind       - Replace a workbook (raw .xlsx body)
  - POST /api/refresh        - Clear every cached result

Additional endpoints:
  - GET  /health             - Health check
  - GET  /version            - Server version and workbooks
  - GET  /                   - API documentation

Workbook paths and the refresh interval come from the YAML config and the
PATH_GERAL, PATH_VISA, PATH_HACCP, REFRESH_INTERVAL and CACHE_DEFAULT_TIMEOUT
environment variables.

Example usage:
  mcdagua-server                            # Start on localhost:8000
  mcdagua-server --host 0.0.0.0 --port 3000 --watch

  curl "http://localhost:8000/api/visa?regional=SP|RJ&q=frango"
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "MCDAGUA_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "MCDAGUA_PORT")]
    port: u16,

    /// Dashboard YAML (built-in layout when omitted)
    #[arg(short, long, env = "MCDAGUA_CONFIG")]
    config: Option<PathBuf>,

    /// Invalidate a workbook's cache as soon as its file changes
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
        config_path: args.config,
        watch: args.watch,
    };

    run_api_server(config).await
}
