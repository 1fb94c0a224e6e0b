//! アダプタのセレクタ（実行時選択用）
//!
//! ビルド時のfeatureフラグではなく、実行時に設定でバックエンドを選択する
//! ための列挙型。vtableのオーバーヘッドを避けるため、trait objectではなく
//! enumでディスパッチ。

use crate::domain::config::{ControlConfig, TrackerBackend, TrackerConfig};
use crate::domain::{ControlPort, DomainResult, Frame, HandLandmarks, MouseButton, TrackerPort};
use crate::infrastructure::control::EnigoControlAdapter;
use crate::infrastructure::landmark::MediaPipeTrackerAdapter;
use crate::infrastructure::mock_control::MockControlAdapter;
use crate::infrastructure::mock_tracker::MockTrackerAdapter;

/// トラッカーバックエンドの選択
pub enum TrackerSelector {
    /// MediaPipe Hand Landmarker（Pythonヘルパーサブプロセス）
    MediaPipe(MediaPipeTrackerAdapter),
    /// モック（固定のランドマーク、Python環境なしでの動作確認用）
    Mock(MockTrackerAdapter),
}

impl TrackerSelector {
    /// 設定からバックエンドを選択して初期化
    pub fn from_config(config: &TrackerConfig) -> DomainResult<Self> {
        match config.backend {
            TrackerBackend::Mediapipe => {
                Ok(Self::MediaPipe(MediaPipeTrackerAdapter::new(config)?))
            }
            TrackerBackend::Mock => Ok(Self::Mock(MockTrackerAdapter::new())),
        }
    }
}

impl TrackerPort for TrackerSelector {
    fn detect_hands(&mut self, frame: &Frame) -> DomainResult<Vec<HandLandmarks>> {
        match self {
            Self::MediaPipe(adapter) => adapter.detect_hands(frame),
            Self::Mock(adapter) => adapter.detect_hands(frame),
        }
    }

    fn backend_name(&self) -> &'static str {
        match self {
            Self::MediaPipe(adapter) => adapter.backend_name(),
            Self::Mock(adapter) => adapter.backend_name(),
        }
    }
}

/// コントロールバックエンドの選択
pub enum ControlSelector {
    /// enigoによる実際のOS入力注入
    Enigo(EnigoControlAdapter),
    /// ドライラン（アクションをログに出すだけ）
    Mock(MockControlAdapter),
}

impl ControlSelector {
    /// 設定からバックエンドを選択して初期化
    ///
    /// `dry_run = true`のときは実際のOS入力を行わないモックを使う。
    pub fn from_config(config: &ControlConfig) -> DomainResult<Self> {
        if config.dry_run {
            tracing::warn!("Dry run enabled: no real input will be injected");
            Ok(Self::Mock(MockControlAdapter::new()))
        } else {
            Ok(Self::Enigo(EnigoControlAdapter::new()?))
        }
    }
}

impl ControlPort for ControlSelector {
    fn screen_size(&self) -> (u32, u32) {
        match self {
            Self::Enigo(adapter) => adapter.screen_size(),
            Self::Mock(adapter) => adapter.screen_size(),
        }
    }

    fn move_cursor(&mut self, x: i32, y: i32) -> DomainResult<()> {
        match self {
            Self::Enigo(adapter) => adapter.move_cursor(x, y),
            Self::Mock(adapter) => adapter.move_cursor(x, y),
        }
    }

    fn click(&mut self, button: MouseButton, double: bool) -> DomainResult<()> {
        match self {
            Self::Enigo(adapter) => adapter.click(button, double),
            Self::Mock(adapter) => adapter.click(button, double),
        }
    }

    fn scroll(&mut self, amount: i32) -> DomainResult<()> {
        match self {
            Self::Enigo(adapter) => adapter.scroll(amount),
            Self::Mock(adapter) => adapter.scroll(amount),
        }
    }

    fn key_tap(&mut self, key: &str) -> DomainResult<()> {
        match self {
            Self::Enigo(adapter) => adapter.key_tap(key),
            Self::Mock(adapter) => adapter.key_tap(key),
        }
    }

    fn type_text(&mut self, text: &str) -> DomainResult<()> {
        match self {
            Self::Enigo(adapter) => adapter.type_text(text),
            Self::Mock(adapter) => adapter.type_text(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_tracker_selection() {
        let config = TrackerConfig {
            backend: TrackerBackend::Mock,
            ..TrackerConfig::default()
        };
        let selector = TrackerSelector::from_config(&config).unwrap();
        assert_eq!(selector.backend_name(), "mock");
    }

    #[test]
    fn test_mediapipe_selection_fails_without_script() {
        let config = TrackerConfig {
            backend: TrackerBackend::Mediapipe,
            script: "/nonexistent/hand_landmarker.py".to_string(),
            ..TrackerConfig::default()
        };
        assert!(TrackerSelector::from_config(&config).is_err());
    }

    #[test]
    fn test_dry_run_control_selection() {
        let config = ControlConfig {
            dry_run: true,
            ..ControlConfig::default()
        };
        let selector = ControlSelector::from_config(&config).unwrap();
        assert!(matches!(selector, ControlSelector::Mock(_)));
    }
}
