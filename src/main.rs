use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use scenecast::dispatch::{SceneConfig, SceneThread};
use scenecast::scene::{CameraDirectory, SceneContext, Vec3};
use scenecast::server::{ControlRouter, ControlServer, ServerConfig};
use scenecast::session::{PublisherConfig, SessionCoordinator, DEFAULT_INGEST_BASE, INGEST_BASE_ENV};
use scenecast::transport::WebRtcTransport;

#[derive(Parser, Debug)]
#[command(name = "scenecast")]
#[command(about = "Remote camera control with WHIP publishing", long_about = None)]
struct Args {
    /// Control listener address
    #[arg(long, env = "SCENECAST_BIND", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Base URL of the WHIP ingest server
    #[arg(long, env = INGEST_BASE_ENV, default_value = DEFAULT_INGEST_BASE)]
    whip_host: String,

    /// Cameras present at startup
    #[arg(long = "camera", default_value = "MainCamera")]
    cameras: Vec<String>,

    /// Capture width in pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Capture height in pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Extra attempts for a failed offer POST
    #[arg(long, env = "SCENECAST_POST_RETRIES", default_value_t = 0)]
    post_retries: u32,

    /// How long a control request waits for the scene, in milliseconds
    #[arg(long, env = "SCENECAST_DISPATCH_TIMEOUT_MS", default_value_t = 5000)]
    dispatch_timeout_ms: u64,

    /// STUN/TURN server URL (repeatable)
    #[arg(long = "ice-server")]
    ice_servers: Vec<String>,
}

#[tokio::main]
async fn main() -> scenecast::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let publisher = PublisherConfig::default()
        .ingest_base(args.whip_host.clone())
        .capture_size(args.width, args.height)
        .post_retries(args.post_retries);
    let cameras = args.cameras.clone();
    let ice_servers = args.ice_servers.clone();

    tracing::info!(
        ingest = %publisher.ingest_base,
        cameras = ?cameras,
        "Starting scene"
    );

    let scene = SceneThread::spawn(SceneConfig::default(), move || {
        let mut directory = CameraDirectory::new();
        for name in &cameras {
            if let Err(e) = directory.create(name, Vec3::ZERO) {
                tracing::warn!(camera = %name, error = %e, "Skipping startup camera");
            }
        }

        let transport = WebRtcTransport::new()?.ice_servers(ice_servers);
        Ok(SceneContext::new(
            directory,
            SessionCoordinator::new(publisher, Rc::new(transport)),
        ))
    })?;

    let config = ServerConfig::with_addr(args.bind)
        .dispatch_timeout(Duration::from_millis(args.dispatch_timeout_ms));
    let server = ControlServer::new(config, ControlRouter::with_default_routes(), scene.dispatcher());

    let result = server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    scene.shutdown().await;
    result
}
