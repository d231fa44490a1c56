use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::Config;
use services::{
    create_detector,
    create_frame_source,
    create_overlay_factory,
    create_window_locator,
    Collaborators,
    LoopController,
};

#[derive(Parser, Debug)]
#[command(name = "detect-overlay")]
#[command(about = "Прозрачный оверлей с рамками детекций YOLO поверх окна игры")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "overlay.toml")]
    config: String,

    /// Режим сухого запуска (сценарное окно, синтетические кадры, без реального окна оверлея)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (перекрывает [logging].level)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config)?);

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск detect-overlay v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - захват и окно оверлея заменены заглушками");
    }

    // Инициализация компонентов
    let collaborators = Collaborators {
        locator: create_window_locator(config.clone(), args.dry_run)?,
        frame_source: create_frame_source(args.dry_run),
        detector: create_detector(&config, args.dry_run)?,
        overlay_factory: create_overlay_factory(args.dry_run),
    };

    info!("Все компоненты инициализированы");

    // Ctrl+C - штатная остановка, не ошибка
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Получен сигнал завершения (Ctrl+C)");
                let _ = shutdown_tx.send(true);
            }
            Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
        }
    });

    let mut controller = LoopController::new(config, collaborators, shutdown_rx);
    if let Err(e) = controller.run().await {
        error!("Цикл остановлен фатальной ошибкой: {}", e);
        return Err(e.into());
    }

    info!("detect-overlay завершил работу");
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        "json" => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer().compact()).init(),
    }

    Ok(())
}
