//! 設定管理
//!
//! TOML設定ファイルの読み込みとDomain型への変換。
//! doc commentはgenerate_schemaでCONFIGURATION.mdに反映される。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::{DomainError, DomainResult, Gesture, MouseButton};

/// 制御モード
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// 人差し指でカーソルを操作（ピンチでクリック）
    Pointer,
    /// ジェスチャーをアクションにマッピング
    Gesture,
    /// 両方
    #[default]
    Both,
}

impl ControlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pointer => "pointer",
            Self::Gesture => "gesture",
            Self::Both => "both",
        }
    }

    /// ポインタ操作が有効か
    pub fn pointer_enabled(&self) -> bool {
        matches!(self, Self::Pointer | Self::Both)
    }

    /// ジェスチャーアクションが有効か
    pub fn gesture_enabled(&self) -> bool {
        matches!(self, Self::Gesture | Self::Both)
    }
}

impl FromStr for ControlMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pointer" => Ok(Self::Pointer),
            "gesture" => Ok(Self::Gesture),
            "both" => Ok(Self::Both),
            other => Err(DomainError::Configuration(format!(
                "Unknown control mode '{}' (expected pointer/gesture/both)",
                other
            ))),
        }
    }
}

/// トラッカーバックエンド
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrackerBackend {
    /// MediaPipe Hand Landmarker（Pythonヘルパーサブプロセス経由）
    #[default]
    Mediapipe,
    /// モック（固定のランドマークを返す、Python環境なしでの動作確認用）
    Mock,
}

/// マウスボタン（設定ファイル用）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ButtonConfig {
    #[default]
    Left,
    Right,
    Middle,
}

impl From<ButtonConfig> for MouseButton {
    fn from(config: ButtonConfig) -> Self {
        match config {
            ButtonConfig::Left => MouseButton::Left,
            ButtonConfig::Right => MouseButton::Right,
            ButtonConfig::Middle => MouseButton::Middle,
        }
    }
}

/// アプリケーション設定のルート構造
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AppConfig {
    /// カメラ設定
    #[serde(default)]
    pub camera: CameraConfig,
    /// ランドマーク検出設定
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// 制御設定（ポインタ・クリック・ホールド時間）
    #[serde(default)]
    pub control: ControlConfig,
    /// ジェスチャーとアクションの対応表
    #[serde(default)]
    pub actions: ActionsConfig,
    /// プレビューウィンドウ設定
    #[serde(default)]
    pub preview: PreviewConfig,
    /// パイプライン設定
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// カメラ設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CameraConfig {
    /// カメラデバイスのインデックス
    ///
    /// デフォルト: 0
    pub index: i32,

    /// 要求するフレーム幅（ピクセル）
    ///
    /// デフォルト: 1280
    pub width: u32,

    /// 要求するフレーム高さ（ピクセル）
    ///
    /// デフォルト: 720
    pub height: u32,

    /// 要求するフレームレート
    ///
    /// デフォルト: 30
    pub fps: u32,

    /// 水平ミラー（鏡像）で取り込むか
    ///
    /// デフォルト: true（--no-flipで無効化）
    pub mirror: bool,

    /// 連続フレーム取りこぼし許容回数
    ///
    /// この回数を超えたらカメラを再オープンする
    /// デフォルト: 90回（約3秒 @ 30fps）
    pub max_consecutive_misses: u32,

    /// 再オープン時の初期待機時間（ミリ秒）
    ///
    /// デフォルト: 100ms
    pub reopen_initial_delay_ms: u64,

    /// 再オープン時の最大待機時間（ミリ秒、指数バックオフの上限）
    ///
    /// デフォルト: 5000ms
    pub reopen_max_delay_ms: u64,
}

impl CameraConfig {
    /// デフォルトのフレーム幅
    pub const DEFAULT_WIDTH: u32 = 1280;
    /// デフォルトのフレーム高さ
    pub const DEFAULT_HEIGHT: u32 = 720;
    /// デフォルトのフレームレート
    pub const DEFAULT_FPS: u32 = 30;
    /// デフォルトの連続取りこぼし閾値（約3秒 @ 30fps）
    pub const DEFAULT_MAX_CONSECUTIVE_MISSES: u32 = 90;
    /// デフォルトの再オープン初期遅延（ミリ秒）
    pub const DEFAULT_REOPEN_INITIAL_DELAY_MS: u64 = 100;
    /// デフォルトの再オープン最大遅延（ミリ秒）
    pub const DEFAULT_REOPEN_MAX_DELAY_MS: u64 = 5000;

    pub fn reopen_initial_delay(&self) -> Duration {
        Duration::from_millis(self.reopen_initial_delay_ms)
    }

    pub fn reopen_max_delay(&self) -> Duration {
        Duration::from_millis(self.reopen_max_delay_ms)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            fps: Self::DEFAULT_FPS,
            mirror: true,
            max_consecutive_misses: Self::DEFAULT_MAX_CONSECUTIVE_MISSES,
            reopen_initial_delay_ms: Self::DEFAULT_REOPEN_INITIAL_DELAY_MS,
            reopen_max_delay_ms: Self::DEFAULT_REOPEN_MAX_DELAY_MS,
        }
    }
}

/// ランドマーク検出設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TrackerConfig {
    /// 検出バックエンド
    ///
    /// 選択肢: "mediapipe", "mock"
    /// デフォルト: "mediapipe"
    #[serde(default)]
    pub backend: TrackerBackend,

    /// Pythonインタープリタのパス
    ///
    /// デフォルト: "python3"
    pub python: String,

    /// ヘルパースクリプトのパス
    ///
    /// デフォルト: "scripts/hand_landmarker.py"
    pub script: String,

    /// 同時に検出する手の最大数
    ///
    /// 制御には1で十分
    /// デフォルト: 1
    pub max_num_hands: u32,

    /// 検出信頼度の下限 [0,1]
    ///
    /// デフォルト: 0.7
    pub min_detection_confidence: f32,

    /// トラッキング信頼度の下限 [0,1]
    ///
    /// デフォルト: 0.5
    pub min_tracking_confidence: f32,
}

impl TrackerConfig {
    /// デフォルトの検出信頼度下限
    pub const DEFAULT_MIN_DETECTION_CONFIDENCE: f32 = 0.7;
    /// デフォルトのトラッキング信頼度下限
    pub const DEFAULT_MIN_TRACKING_CONFIDENCE: f32 = 0.5;
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            backend: TrackerBackend::default(),
            python: "python3".to_string(),
            script: "scripts/hand_landmarker.py".to_string(),
            max_num_hands: 1,
            min_detection_confidence: Self::DEFAULT_MIN_DETECTION_CONFIDENCE,
            min_tracking_confidence: Self::DEFAULT_MIN_TRACKING_CONFIDENCE,
        }
    }
}

/// 制御設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ControlConfig {
    /// 制御モード
    ///
    /// 選択肢: "pointer", "gesture", "both"
    /// デフォルト: "both"
    #[serde(default)]
    pub mode: ControlMode,

    /// カーソル平滑化係数 (0,1]
    ///
    /// 新しいサンプルの重み。1.0で平滑化なし、小さいほど滑らか（遅延大）
    /// デフォルト: 0.7
    pub smoothing: f32,

    /// ピンチクリックの距離閾値（正規化座標）
    ///
    /// 親指先と人差し指先がこの距離未満でクリックと判定
    /// デフォルト: 0.03
    pub click_threshold: f32,

    /// クリックの最小間隔（ミリ秒）
    ///
    /// デフォルト: 300ms
    pub click_cooldown_ms: u64,

    /// クリック系ホールドの発火開始時間（ミリ秒）
    ///
    /// デフォルト: 1000ms
    pub hold_click_min_ms: u64,

    /// クリック系ホールドの発火終了時間（ミリ秒）
    ///
    /// この時間を過ぎてもホールドし続けた場合は発火しない
    /// デフォルト: 1500ms
    pub hold_click_max_ms: u64,

    /// スクロール系ホールドの発火開始時間（ミリ秒）
    ///
    /// デフォルト: 800ms
    pub hold_scroll_ms: u64,

    /// スクロールの繰り返し間隔（ミリ秒）
    ///
    /// ホールド継続中はこの間隔でスクロールを繰り返す
    /// デフォルト: 150ms
    pub scroll_repeat_ms: u64,

    /// リセット系ホールドの発火時間（ミリ秒）
    ///
    /// デフォルト: 500ms
    pub hold_reset_ms: u64,

    /// ドライラン（実際のOS入力を行わず、アクションをログに出すだけ）
    ///
    /// デフォルト: false
    #[serde(default)]
    pub dry_run: bool,
}

impl ControlConfig {
    /// デフォルトの平滑化係数
    pub const DEFAULT_SMOOTHING: f32 = 0.7;
    /// デフォルトのピンチクリック閾値（分類器側の定数と共有）
    pub const DEFAULT_CLICK_THRESHOLD: f32 = crate::domain::gesture::DEFAULT_PINCH_THRESHOLD;
    /// デフォルトのクリック最小間隔（ミリ秒）
    pub const DEFAULT_CLICK_COOLDOWN_MS: u64 = 300;

    pub fn click_cooldown(&self) -> Duration {
        Duration::from_millis(self.click_cooldown_ms)
    }

    pub fn hold_click_window(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.hold_click_min_ms),
            Duration::from_millis(self.hold_click_max_ms),
        )
    }

    pub fn hold_scroll(&self) -> Duration {
        Duration::from_millis(self.hold_scroll_ms)
    }

    pub fn scroll_repeat(&self) -> Duration {
        Duration::from_millis(self.scroll_repeat_ms)
    }

    pub fn hold_reset(&self) -> Duration {
        Duration::from_millis(self.hold_reset_ms)
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            mode: ControlMode::default(),
            smoothing: Self::DEFAULT_SMOOTHING,
            click_threshold: Self::DEFAULT_CLICK_THRESHOLD,
            click_cooldown_ms: Self::DEFAULT_CLICK_COOLDOWN_MS,
            hold_click_min_ms: 1000,
            hold_click_max_ms: 1500,
            hold_scroll_ms: 800,
            scroll_repeat_ms: 150,
            hold_reset_ms: 500,
            dry_run: false,
        }
    }
}

/// ジェスチャーに割り当てるアクション
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ActionBinding {
    /// クリック
    Click {
        /// 押すボタン
        #[serde(default)]
        button: ButtonConfig,
        /// ダブルクリックにするか
        #[serde(default)]
        double: bool,
    },
    /// 垂直スクロール（amount正 = 上方向）
    Scroll { amount: i32 },
    /// キーを1回タップ（"space", "enter" 等）
    Key { key: String },
    /// ポインタ・平滑化状態のリセット
    Reset,
    /// 何もしない
    None,
}

/// ジェスチャーとアクションの対応表
///
/// デフォルトは FIST=右クリック, PEACE=ダブルクリック,
/// THUMBS_UP=上スクロール, OK=下スクロール, OPEN_HAND=リセット。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionsConfig {
    /// FISTに割り当てるアクション
    #[serde(default = "ActionsConfig::default_fist")]
    pub fist: ActionBinding,
    /// PEACEに割り当てるアクション
    #[serde(default = "ActionsConfig::default_peace")]
    pub peace: ActionBinding,
    /// THUMBS_UPに割り当てるアクション
    #[serde(default = "ActionsConfig::default_thumbs_up")]
    pub thumbs_up: ActionBinding,
    /// OKに割り当てるアクション
    #[serde(default = "ActionsConfig::default_ok")]
    pub ok: ActionBinding,
    /// OPEN_HANDに割り当てるアクション
    #[serde(default = "ActionsConfig::default_open_hand")]
    pub open_hand: ActionBinding,
}

impl ActionsConfig {
    fn default_fist() -> ActionBinding {
        ActionBinding::Click {
            button: ButtonConfig::Right,
            double: false,
        }
    }

    fn default_peace() -> ActionBinding {
        ActionBinding::Click {
            button: ButtonConfig::Left,
            double: true,
        }
    }

    fn default_thumbs_up() -> ActionBinding {
        ActionBinding::Scroll { amount: 3 }
    }

    fn default_ok() -> ActionBinding {
        ActionBinding::Scroll { amount: -3 }
    }

    fn default_open_hand() -> ActionBinding {
        ActionBinding::Reset
    }

    /// ジェスチャーに対応するバインディングを取得
    ///
    /// POINTとピンチはポインタ操作専用のため対応表には含めない。
    pub fn binding_for(&self, gesture: Gesture) -> Option<&ActionBinding> {
        match gesture {
            Gesture::Fist => Some(&self.fist),
            Gesture::Peace => Some(&self.peace),
            Gesture::ThumbsUp => Some(&self.thumbs_up),
            Gesture::Ok => Some(&self.ok),
            Gesture::OpenHand => Some(&self.open_hand),
            _ => None,
        }
    }
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            fist: Self::default_fist(),
            peace: Self::default_peace(),
            thumbs_up: Self::default_thumbs_up(),
            ok: Self::default_ok(),
            open_hand: Self::default_open_hand(),
        }
    }
}

/// プレビューウィンドウ設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PreviewConfig {
    /// プレビューウィンドウを表示するか
    ///
    /// デフォルト: true（--no-previewで無効化）
    pub enabled: bool,

    /// ウィンドウタイトル
    pub window_title: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_title: "Tenohira".to_string(),
        }
    }
}

/// パイプライン設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    /// 統計情報の出力間隔（秒）
    pub stats_interval_sec: u64,
}

impl PipelineConfig {
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_sec)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stats_interval_sec: 10,
        }
    }
}

impl AppConfig {
    /// TOMLファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> DomainResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Configuration(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content)
            .map_err(|e| DomainError::Configuration(format!("Failed to parse config file: {}", e)))
    }

    /// デフォルト設定をTOMLファイルに書き出す
    pub fn write_default<P: AsRef<Path>>(path: P) -> DomainResult<()> {
        let config = Self::default();
        let content = toml::to_string_pretty(&config).map_err(|e| {
            DomainError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)
            .map_err(|e| DomainError::Configuration(format!("Failed to write config file: {}", e)))
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> DomainResult<()> {
        // カメラ設定の検証
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(DomainError::Configuration(
                "Camera width and height must be greater than 0".to_string(),
            ));
        }
        if self.camera.fps == 0 {
            return Err(DomainError::Configuration(
                "Camera fps must be greater than 0".to_string(),
            ));
        }
        if self.camera.max_consecutive_misses == 0 {
            return Err(DomainError::Configuration(
                "max_consecutive_misses must be greater than 0".to_string(),
            ));
        }

        // トラッカー設定の検証
        if self.tracker.max_num_hands == 0 {
            return Err(DomainError::Configuration(
                "max_num_hands must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("min_detection_confidence", self.tracker.min_detection_confidence),
            ("min_tracking_confidence", self.tracker.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::Configuration(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        // 制御設定の検証
        if !(self.control.smoothing > 0.0 && self.control.smoothing <= 1.0) {
            return Err(DomainError::Configuration(
                "Smoothing factor must be within (0, 1]".to_string(),
            ));
        }
        if self.control.click_threshold <= 0.0 {
            return Err(DomainError::Configuration(
                "Click threshold must be positive".to_string(),
            ));
        }
        if self.control.hold_click_min_ms >= self.control.hold_click_max_ms {
            return Err(DomainError::Configuration(
                "hold_click_min_ms must be less than hold_click_max_ms".to_string(),
            ));
        }
        if self.control.scroll_repeat_ms == 0 {
            return Err(DomainError::Configuration(
                "scroll_repeat_ms must be greater than 0".to_string(),
            ));
        }

        // パイプライン設定の検証
        if self.pipeline.stats_interval_sec == 0 {
            return Err(DomainError::Configuration(
                "stats_interval_sec must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
