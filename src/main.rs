mod app_service;
mod app_state;
mod auth;
mod commands;
mod config;
mod domain;
mod error;
mod service;
mod storage;
mod ui;

use anyhow::Context;
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::app_service::handle_request;
use crate::app_state::{App, AppEvent};
use crate::auth::AdminGate;
use crate::commands::Request;
use crate::config::AppConfig;
use crate::domain::upload::UploadPolicy;
use crate::service::Services;
use crate::storage::seed::seed_reference_data;
use crate::ui::draw;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let ts = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let log_dir = std::path::PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join(format!("app-{}.log", ts));
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("cannot create log file {}", log_path.display()))?;
    // the terminal belongs to the UI, so logs go to a file
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter_level(log::LevelFilter::Warn)
        .filter_module("tpmdesk", log::LevelFilter::Info)
        .filter_module("sqlx", log::LevelFilter::Error)
        .filter_module("sea_orm", log::LevelFilter::Error)
        .init();

    let mut startup_info = Vec::new();
    match dotenv::dotenv() {
        Ok(path) => startup_info.push(format!("✓ Konfigurasi dibaca dari {}", path.display())),
        Err(_) => startup_info.push("⚠ File .env tidak ditemukan, memakai nilai bawaan".to_string()),
    }
    let cfg = AppConfig::from_env();
    info!("starting with {:?}", cfg.database_url);

    let db = storage::establish_connection(
        &cfg.database_url,
        cfg.db_max_connections,
        cfg.db_min_connections,
    )
    .await
    .with_context(|| format!("cannot open database {}", cfg.database_url))?;
    startup_info.push("✓ Basis data siap".to_string());

    if cfg.seed_reference_data {
        match seed_reference_data(&db).await {
            Ok(true) => startup_info.push("✓ Data departemen awal dimuat".to_string()),
            Ok(false) => {}
            Err(e) => {
                error!("seeding reference data failed: {:?}", e);
                startup_info.push("⚠ Gagal memuat data departemen awal".to_string());
            }
        }
    }

    let db = Arc::new(db);
    let services = Services::new(db, &cfg);

    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Request>();
    let (evt_tx, evt_rx) = mpsc::unbounded_channel::<AppEvent>();

    // single background actor: requests are handled one at a time, in order
    tokio::spawn(async move {
        while let Some(req) = cmd_rx.recv().await {
            handle_request(&services, req, &evt_tx).await;
        }
        info!("request channel closed");
    });
    let _ = cmd_tx.send(Request::LoadReference);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(
        startup_info,
        AdminGate::from_config(&cfg),
        UploadPolicy::from_config(&cfg),
        cmd_tx,
        evt_rx,
    );

    let res = match app.evt_rx.take() {
        Some(rx) => run_app_loop(&mut terminal, &mut app, rx).await,
        None => Ok(()),
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.context("terminal loop failed")
}

async fn run_app_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut evt_rx: mpsc::UnboundedReceiver<AppEvent>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        while let Ok(event) = evt_rx.try_recv() {
            app.apply_event(event);
        }

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key_event(key.code) {
                    return Ok(());
                }
            }
        }
    }
}
