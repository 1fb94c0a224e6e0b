/// OS入力注入アダプタ
///
/// enigoを使用したカーソル移動・クリック・スクロール・キー送出の実装。
/// 入力イベントの合成そのものはenigo（各OSのネイティブAPI）に委譲する。

use std::time::Duration;

use enigo::{Axis, Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use crate::domain::{ControlPort, DomainError, DomainResult, MouseButton};

/// ダブルクリックの2打点間の待機時間
const DOUBLE_CLICK_GAP: Duration = Duration::from_millis(30);

/// ボタン名をenigoの型へ変換
fn to_enigo_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

/// キー名をenigoの型へ変換
///
/// 名前付きキーと1文字キーに対応。未知の名前はNone。
fn parse_key(name: &str) -> Option<Key> {
    let key = match name.to_ascii_lowercase().as_str() {
        "space" => Key::Space,
        "enter" | "return" => Key::Return,
        "escape" | "esc" => Key::Escape,
        "tab" => Key::Tab,
        "backspace" => Key::Backspace,
        "delete" => Key::Delete,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "home" => Key::Home,
        "end" => Key::End,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Unicode(c),
                _ => return None,
            }
        }
    };
    Some(key)
}

/// enigoコントロールアダプタ
pub struct EnigoControlAdapter {
    enigo: Enigo,
    screen_width: u32,
    screen_height: u32,
}

impl EnigoControlAdapter {
    /// 新しいアダプタを作成
    ///
    /// プライマリディスプレイの解像度はenigoから取得する。
    pub fn new() -> DomainResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| DomainError::Initialization(format!("Failed to initialize enigo: {:?}", e)))?;

        let (width, height) = enigo
            .main_display()
            .map_err(|e| DomainError::Initialization(format!("Failed to query display size: {:?}", e)))?;
        if width <= 0 || height <= 0 {
            return Err(DomainError::Initialization(format!(
                "Invalid display size reported: {}x{}",
                width, height
            )));
        }

        tracing::info!("Input injection ready, display {}x{}", width, height);

        Ok(Self {
            enigo,
            screen_width: width as u32,
            screen_height: height as u32,
        })
    }
}

impl ControlPort for EnigoControlAdapter {
    fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    fn move_cursor(&mut self, x: i32, y: i32) -> DomainResult<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| DomainError::Control(format!("Failed to move cursor: {:?}", e)))
    }

    fn click(&mut self, button: MouseButton, double: bool) -> DomainResult<()> {
        let button = to_enigo_button(button);
        self.enigo
            .button(button, Direction::Click)
            .map_err(|e| DomainError::Control(format!("Failed to click: {:?}", e)))?;

        if double {
            std::thread::sleep(DOUBLE_CLICK_GAP);
            self.enigo
                .button(button, Direction::Click)
                .map_err(|e| DomainError::Control(format!("Failed to double click: {:?}", e)))?;
        }
        Ok(())
    }

    fn scroll(&mut self, amount: i32) -> DomainResult<()> {
        // enigoは正の値で下方向。ポートの規約（正 = 上）に合わせて符号を反転する
        self.enigo
            .scroll(-amount, Axis::Vertical)
            .map_err(|e| DomainError::Control(format!("Failed to scroll: {:?}", e)))
    }

    fn key_tap(&mut self, key: &str) -> DomainResult<()> {
        let parsed = parse_key(key)
            .ok_or_else(|| DomainError::Control(format!("Unknown key name '{}'", key)))?;
        self.enigo
            .key(parsed, Direction::Click)
            .map_err(|e| DomainError::Control(format!("Failed to tap key '{}': {:?}", key, e)))
    }

    fn type_text(&mut self, text: &str) -> DomainResult<()> {
        self.enigo
            .text(text)
            .map_err(|e| DomainError::Control(format!("Failed to type text: {:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_keys() {
        assert!(matches!(parse_key("space"), Some(Key::Space)));
        assert!(matches!(parse_key("Enter"), Some(Key::Return)));
        assert!(matches!(parse_key("esc"), Some(Key::Escape)));
        assert!(matches!(parse_key("pagedown"), Some(Key::PageDown)));
    }

    #[test]
    fn test_parse_single_char_key() {
        assert!(matches!(parse_key("a"), Some(Key::Unicode('a'))));
        assert!(matches!(parse_key("5"), Some(Key::Unicode('5'))));
    }

    #[test]
    fn test_parse_unknown_key() {
        assert!(parse_key("no-such-key").is_none());
        assert!(parse_key("").is_none());
    }

    #[test]
    fn test_button_mapping() {
        assert!(matches!(to_enigo_button(MouseButton::Left), Button::Left));
        assert!(matches!(to_enigo_button(MouseButton::Right), Button::Right));
        assert!(matches!(to_enigo_button(MouseButton::Middle), Button::Middle));
    }
}
