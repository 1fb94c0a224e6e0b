mod application;
mod domain;
mod infrastructure;
mod logging;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::application::controller::GestureController;
use crate::application::cursor::CursorMapper;
use crate::application::pipeline::ControlLoop;
use crate::application::recovery::{CameraRecovery, RecoveryPolicy};
use crate::application::stats::StatsCollector;
use crate::domain::config::{AppConfig, ControlMode};
use crate::domain::ports::{CapturePort, ControlPort};
use crate::infrastructure::camera::OpenCvCameraAdapter;
use crate::infrastructure::preview::{PreviewCommand, PreviewWindow};
use crate::infrastructure::selector::{ControlSelector, TrackerSelector};
use crate::logging::init_logging;

/// 制御モード（CLI用）
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    Pointer,
    Gesture,
    Both,
}

impl From<CliMode> for ControlMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Pointer => ControlMode::Pointer,
            CliMode::Gesture => ControlMode::Gesture,
            CliMode::Both => ControlMode::Both,
        }
    }
}

/// Webカメラの手ジェスチャーでマウス・キーボードを操作するユーティリティ
#[derive(Debug, Parser)]
#[command(name = "tenohira", version, about)]
struct Cli {
    /// カメラデバイスのインデックス
    #[arg(long)]
    camera: Option<i32>,

    /// 水平ミラー（鏡像）を無効にする
    #[arg(long)]
    no_flip: bool,

    /// プレビューウィンドウを表示しない
    #[arg(long)]
    no_preview: bool,

    /// 制御モード
    #[arg(long, value_enum)]
    mode: Option<CliMode>,

    /// 設定ファイルのパス
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// デフォルト設定を書き出して終了
    #[arg(long)]
    write_default_config: bool,

    /// ログをファイルに出力するディレクトリ（省略時は標準出力）
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// デバッグログを有効にする
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // ログシステムの初期化（RUST_LOGが設定されていればそちらを優先）
    // 注意: _guardはmain終了まで保持する必要がある（Dropでログスレッドが終了）
    let level = if cli.verbose { "debug" } else { "info" };
    let _guard = init_logging(level, false, cli.log_dir.clone());

    tracing::info!("Tenohira starting...");

    match run(cli) {
        Ok(_) => {
            tracing::info!("Tenohira terminated gracefully.");
        }
        Err(e) => {
            tracing::error!("Fatal error: {:?}", e);
            std::process::exit(1);
        }
    }
}

/// アプリケーションのメイン処理
fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.write_default_config {
        AppConfig::write_default(&cli.config)
            .with_context(|| format!("could not write {:?}", cli.config))?;
        tracing::info!("Wrote default configuration to {:?}", cli.config);
        return Ok(());
    }

    // 設定ファイルの読み込み（存在しない場合はデフォルト設定を使用）
    let mut config = match AppConfig::from_file(&cli.config) {
        Ok(config) => {
            tracing::info!("Loaded configuration from {:?}", cli.config);
            config
        }
        Err(e) => {
            tracing::warn!("Failed to load {:?}: {:?}, using defaults", cli.config, e);
            AppConfig::default()
        }
    };

    // CLIフラグで設定を上書き
    if let Some(camera) = cli.camera {
        config.camera.index = camera;
    }
    if cli.no_flip {
        config.camera.mirror = false;
    }
    if cli.no_preview {
        config.preview.enabled = false;
    }
    if let Some(mode) = cli.mode {
        config.control.mode = mode.into();
    }

    // 設定の検証
    config.validate()?;

    tracing::info!("Configuration validated successfully");
    tracing::info!(
        "Camera: index={}, {}x{} @ {}fps, mirror={}",
        config.camera.index,
        config.camera.width,
        config.camera.height,
        config.camera.fps,
        config.camera.mirror
    );
    tracing::info!(
        "Control: mode={}, smoothing={}, dry_run={}",
        config.control.mode.as_str(),
        config.control.smoothing,
        config.control.dry_run
    );

    // カメラアダプタの初期化
    tracing::info!("Opening camera...");
    let camera = OpenCvCameraAdapter::new(&config.camera)
        .with_context(|| format!("could not open camera {}", config.camera.index))?;
    let device = camera.device_info();
    tracing::info!(
        "Camera opened: {}x{} @ {}fps - {}",
        device.width,
        device.height,
        device.fps,
        device.name
    );

    // トラッカーアダプタの初期化（MediaPipeヘルパーの起動を含む）
    let tracker = TrackerSelector::from_config(&config.tracker)?;

    // コントロールアダプタの初期化
    let control = ControlSelector::from_config(&config.control)?;
    let (screen_width, screen_height) = control.screen_size();
    tracing::info!("Target screen: {}x{}", screen_width, screen_height);

    // コントローラの構築
    // ミラーで取り込まない場合はマッピング側でx軸を反転し、
    // 手を右へ動かすとカーソルも右へ動くようにする
    let mapper = CursorMapper::new(
        screen_width,
        screen_height,
        !config.camera.mirror,
        config.control.smoothing,
    );
    let controller = GestureController::new(&config.control, config.actions.clone(), mapper);

    // カメラ再オープン戦略
    let recovery = CameraRecovery::new(RecoveryPolicy {
        consecutive_miss_threshold: config.camera.max_consecutive_misses,
        initial_backoff: config.camera.reopen_initial_delay(),
        max_backoff: config.camera.reopen_max_delay(),
        max_cumulative_failure: std::time::Duration::from_secs(60),
    });

    let stats = StatsCollector::new(config.pipeline.stats_interval());

    let mut preview = if config.preview.enabled {
        Some(PreviewWindow::new(&config.preview.window_title))
    } else {
        None
    };

    tracing::info!("Hand control started");
    tracing::info!("  POINT      - move cursor");
    tracing::info!("  PINCH      - click");
    tracing::info!("  FIST       - right click (hold)");
    tracing::info!("  PEACE      - double click (hold)");
    tracing::info!("  THUMBS UP  - scroll up (hold)");
    tracing::info!("  OK         - scroll down (hold)");
    tracing::info!("  OPEN HAND  - reset (hold)");
    if preview.is_some() {
        tracing::info!("Press 'q' in the preview window to quit, 'r' to reset");
    } else {
        tracing::info!("Preview disabled, stop with Ctrl+C");
    }

    let mode = config.control.mode;
    let mut control_loop = ControlLoop::new(camera, tracker, control, controller, recovery, stats);

    // 単一スレッドの同期ポーリングループ
    loop {
        let report = control_loop.tick()?;

        let Some(preview) = preview.as_mut() else {
            continue;
        };

        if let Some(frame) = &report.frame {
            preview.render(
                frame,
                &report.hands,
                report.gesture,
                mode,
                report.pointer_active,
            )?;
        }

        match preview.poll_key()? {
            PreviewCommand::Quit => {
                tracing::info!("Quit requested");
                break;
            }
            PreviewCommand::Reset => {
                control_loop.reset_controller();
            }
            PreviewCommand::None => {}
        }
    }

    Ok(())
}
