/// エラー型定義
///
/// Domain層の統一エラー型。thiserrorを使用して型安全なエラー処理を提供します。
///
/// # 設計方針
/// - unwrap()の使用を禁止し、明示的なエラーハンドリングを強制
/// - Result型でエラー伝播を明示化
/// - 回復可能性をエラー型で表現（フレーム取りこぼしはエラーではなくOk(None)）

use thiserror::Error;

/// Domain層の統一エラー型
#[allow(dead_code)]
#[derive(Error, Debug)]
pub enum DomainError {
    /// カメラキャプチャ関連のエラー
    #[error("Capture error: {0}")]
    Capture(String),

    /// ランドマーク検出（トラッカー）関連のエラー
    #[error("Tracker error: {0}")]
    Tracker(String),

    /// OS入力注入関連のエラー
    #[error("Control error: {0}")]
    Control(String),

    /// 設定関連のエラー
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// デバイス一時不可（Recoverable）
    ///
    /// カメラの一時的な取り外しなど、再オープンで復旧可能なエラー。
    #[error("Device temporarily unavailable")]
    DeviceNotAvailable,

    /// 再初期化必要（Non-recoverable）
    ///
    /// キャプチャセッションの再作成が必要な致命的エラー。
    #[error("Reinitialization required")]
    ReInitializationRequired,

    /// 初期化エラー
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// その他のエラー
    #[error("Unexpected error: {0}")]
    Other(String),
}

/// Domain層の統一Result型
pub type DomainResult<T> = Result<T, DomainError>;
