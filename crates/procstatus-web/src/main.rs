//! procstatus-web: HTTP endpoint reporting point-in-time host telemetry.
//!
//! Serves `GET /status` with a JSON snapshot read from `/proc` and `/sys`.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod access_log;
mod error;
mod handlers;
mod state;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use procstatus_core::collector::{Collector, HostPaths, RealFs};

use state::SharedState;

// ============================================================
// CLI
// ============================================================

#[derive(Parser, Debug)]
#[command(
    name = "procstatus-web",
    about = "Host telemetry over HTTP",
    version = procstatus_core::VERSION
)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0", env = "PROCSTATUS_HOST")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, default_value = "8080", env = "PROCSTATUS_PORT")]
    port: u16,

    /// Path to /proc filesystem.
    #[arg(long, default_value = HostPaths::DEFAULT_PROC_PATH, env = "PROCSTATUS_PROC_PATH")]
    proc_path: PathBuf,

    /// Real-time clock file holding seconds since epoch.
    #[arg(long, default_value = HostPaths::DEFAULT_RTC_PATH, env = "PROCSTATUS_RTC_PATH")]
    rtc_path: PathBuf,

    /// Per-collector deadline in milliseconds. 0 disables the deadline.
    #[arg(long, default_value = "2000", env = "PROCSTATUS_COLLECT_TIMEOUT_MS")]
    collect_timeout_ms: u64,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn collect_timeout(&self) -> Option<Duration> {
        (self.collect_timeout_ms > 0).then(|| Duration::from_millis(self.collect_timeout_ms))
    }

    fn log_filter(&self) -> EnvFilter {
        let level = if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "procstatus_web={level},procstatus_core={level}"
            ))
        })
    }
}

// ============================================================
// Main
// ============================================================

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(args.log_filter())
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(async_main(args)) {
        error!(error = %e, "server error");
        process::exit(1);
    }
}

async fn async_main(args: Args) -> std::io::Result<()> {
    let paths = HostPaths::new(&args.proc_path, &args.rtc_path);
    let collector = Collector::new(RealFs::new(), paths).with_timeout(args.collect_timeout());

    info!(
        version = procstatus_core::VERSION,
        proc_path = %args.proc_path.display(),
        rtc_path = %args.rtc_path.display(),
        collect_timeout = ?collector.timeout(),
        "starting"
    );

    let state: SharedState = Arc::new(collector);
    let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();

    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening; status available at http://{addr}/status");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

/// Builds the application router around a snapshot source.
pub(crate) fn build_router(state: SharedState) -> Router {
    Router::new()
        .route(
            "/status",
            get(handlers::handle_status).fallback(handlers::handle_not_found),
        )
        .fallback(handlers::handle_not_found)
        .with_state(state)
        .layer(axum::middleware::from_fn(access_log::access_log))
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["procstatus-web"]);
        assert_eq!(args.port, 8080);
        assert_eq!(args.host, IpAddr::from([0, 0, 0, 0]));
        assert_eq!(args.proc_path, PathBuf::from("/proc"));
        assert_eq!(
            args.rtc_path,
            PathBuf::from("/sys/class/rtc/rtc0/since_epoch")
        );
        assert_eq!(args.collect_timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "procstatus-web",
            "--port",
            "9100",
            "--host",
            "127.0.0.1",
            "--proc-path",
            "/host/proc",
            "--collect-timeout-ms",
            "0",
            "-vv",
        ]);
        assert_eq!(args.port, 9100);
        assert_eq!(args.host, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(args.proc_path, PathBuf::from("/host/proc"));
        assert_eq!(args.collect_timeout(), None);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_args_rejects_bad_port() {
        assert!(Args::try_parse_from(["procstatus-web", "--port", "70000"]).is_err());
    }
}
