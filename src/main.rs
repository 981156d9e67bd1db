use clap::Parser;
use forum_monitor::render::Renderer;
use forum_monitor::{
    Args, FetchCycle, HttpRenderer, Monitor, MonitorConfig, Notifier, RendererKind, SeenPosts,
    TelegramChannel,
};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

async fn shutdown_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Received shutdown signal");
    cancel.cancel();
}

fn build_renderer(args: &Args) -> Box<dyn Renderer> {
    match args.renderer {
        RendererKind::Http => Box::new(HttpRenderer),
        #[cfg(feature = "chromium")]
        RendererKind::Chromium => Box::new(forum_monitor::render::chromium::ChromiumRenderer::new(
            args.chrome_path.clone(),
        )),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let file_layer = if args.log_file.as_os_str().is_empty() {
        None
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&args.log_file)
            .map_err(|e| {
                eprintln!("Cannot open log file {}: {}", args.log_file.display(), e);
                e
            })?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let config = MonitorConfig::from_args(&args).map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    info!("Keywords: {}", config.keywords);
    if config.keywords.is_empty() {
        warn!("No keywords configured, nothing will ever match");
    }

    let notifier = Notifier::new(
        TelegramChannel::new(args.bot_token.as_str()),
        config.destination.as_str(),
    );
    let cycle = FetchCycle::new(
        build_renderer(&args),
        notifier,
        config.keywords.clone(),
        config.cycle_settings(),
    );
    let seen = SeenPosts::load(&config.seen_posts_file);
    let mut monitor = Monitor::new(cycle, seen, config.loop_timing());

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    monitor.run(cancel).await;

    info!("Exiting, {} posts recorded", monitor.seen().len());
    Ok(())
}
