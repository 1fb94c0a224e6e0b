/// Port定義（Clean Architectureのインターフェース）
///
/// Domain層が外部実装に依存するための抽象trait。
/// Infrastructure層がこれらを実装し、Application層がDIで注入する。

use crate::domain::{ControlAction, DomainResult, Frame, HandLandmarks, MouseButton};

/// キャプチャポート: カメラフレームの取得を抽象化
pub trait CapturePort: Send {
    /// フレームを1枚キャプチャする
    ///
    /// # Returns
    /// - `Ok(Some(Frame))`: フレームの取得成功
    /// - `Ok(None)`: このサイクルではフレームが得られなかった（スキップして継続）
    /// - `Err(DomainError)`: 致命的エラー（再オープンが必要）
    fn capture_frame(&mut self) -> DomainResult<Option<Frame>>;

    /// キャプチャデバイスを再オープン
    ///
    /// カメラが取り外された場合などに呼び出される。
    fn reinitialize(&mut self) -> DomainResult<()>;

    /// キャプチャデバイスの情報を取得
    fn device_info(&self) -> DeviceInfo;
}

/// デバイス情報
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub name: String,
}

/// トラッカーポート: 手のランドマーク検出を抽象化
///
/// 検出そのものは外部の学習済みモデルに委譲する。本リポジトリは結果の
/// 解釈（ジェスチャー分類）だけを行う。
pub trait TrackerPort: Send {
    /// フレームから手のランドマークを検出する
    ///
    /// # Returns
    /// - `Ok(vec![])`: 手が検出されなかった（エラーではない）
    /// - `Ok(hands)`: 検出された手（最大max_num_hands件）
    /// - `Err(DomainError)`: トラッカープロセスの異常等
    fn detect_hands(&mut self, frame: &Frame) -> DomainResult<Vec<HandLandmarks>>;

    /// バックエンド名（ログ用）
    fn backend_name(&self) -> &'static str;
}

/// コントロールポート: OSへの入力注入を抽象化
///
/// カーソル移動・クリック・スクロール・キー送出。実際のイベント合成は
/// 外部ライブラリ（enigo）に委譲する。
pub trait ControlPort: Send {
    /// プライマリディスプレイの解像度（ピクセル）
    fn screen_size(&self) -> (u32, u32);

    /// カーソルを絶対座標へ移動
    fn move_cursor(&mut self, x: i32, y: i32) -> DomainResult<()>;

    /// クリック（doubleでダブルクリック）
    fn click(&mut self, button: MouseButton, double: bool) -> DomainResult<()>;

    /// 垂直スクロール（正 = 上方向）
    fn scroll(&mut self, amount: i32) -> DomainResult<()>;

    /// 名前指定でキーを1回タップ（"space", "enter", "a" 等）
    fn key_tap(&mut self, key: &str) -> DomainResult<()>;

    /// テキストを入力
    #[allow(dead_code)]
    fn type_text(&mut self, text: &str) -> DomainResult<()>;
}

/// ControlActionをControlPortへディスパッチするヘルパー
///
/// コントローラは操作をデータとして返し、実行はここで一元化する。
pub fn apply_action<C: ControlPort + ?Sized>(
    control: &mut C,
    action: &ControlAction,
) -> DomainResult<()> {
    match action {
        ControlAction::MoveCursor { x, y } => control.move_cursor(*x, *y),
        ControlAction::Click { button, double } => control.click(*button, *double),
        ControlAction::Scroll { amount } => control.scroll(*amount),
        ControlAction::KeyTap { key } => control.key_tap(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingControl {
        log: Vec<String>,
    }

    impl ControlPort for RecordingControl {
        fn screen_size(&self) -> (u32, u32) {
            (1920, 1080)
        }

        fn move_cursor(&mut self, x: i32, y: i32) -> DomainResult<()> {
            self.log.push(format!("move:{x},{y}"));
            Ok(())
        }

        fn click(&mut self, button: MouseButton, double: bool) -> DomainResult<()> {
            self.log.push(format!("click:{button:?}:{double}"));
            Ok(())
        }

        fn scroll(&mut self, amount: i32) -> DomainResult<()> {
            self.log.push(format!("scroll:{amount}"));
            Ok(())
        }

        fn key_tap(&mut self, key: &str) -> DomainResult<()> {
            self.log.push(format!("key:{key}"));
            Ok(())
        }

        fn type_text(&mut self, text: &str) -> DomainResult<()> {
            self.log.push(format!("text:{text}"));
            Ok(())
        }
    }

    #[test]
    fn test_apply_action_dispatch() {
        let mut control = RecordingControl::default();

        apply_action(&mut control, &ControlAction::MoveCursor { x: 10, y: 20 }).unwrap();
        apply_action(
            &mut control,
            &ControlAction::Click {
                button: MouseButton::Right,
                double: false,
            },
        )
        .unwrap();
        apply_action(&mut control, &ControlAction::Scroll { amount: -3 }).unwrap();
        apply_action(
            &mut control,
            &ControlAction::KeyTap {
                key: "space".to_string(),
            },
        )
        .unwrap();

        assert_eq!(
            control.log,
            vec!["move:10,20", "click:Right:false", "scroll:-3", "key:space"]
        );
    }
}
