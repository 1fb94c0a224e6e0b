/// モックコントロールアダプタ
///
/// テスト・ドライラン用のOS入力モック実装。
/// アクションを記録してログに出力するのみで、実際の入力注入は行わない。

use crate::domain::{ControlAction, ControlPort, DomainResult, MouseButton};

/// モックコントロールアダプタ
pub struct MockControlAdapter {
    screen_width: u32,
    screen_height: u32,
    actions: Vec<ControlAction>,
}

impl MockControlAdapter {
    /// デフォルト解像度（1920x1080）のモックを作成
    pub fn new() -> Self {
        Self::with_screen(1920, 1080)
    }

    /// 解像度を指定してモックを作成
    #[allow(dead_code)]
    pub fn with_screen(width: u32, height: u32) -> Self {
        Self {
            screen_width: width,
            screen_height: height,
            actions: Vec::new(),
        }
    }

    /// 記録されたアクション列
    #[allow(dead_code)]
    pub fn actions(&self) -> &[ControlAction] {
        &self.actions
    }

    fn record(&mut self, action: ControlAction) {
        tracing::debug!("MockControl: {:?}", action);
        self.actions.push(action);
    }
}

impl Default for MockControlAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlPort for MockControlAdapter {
    fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    fn move_cursor(&mut self, x: i32, y: i32) -> DomainResult<()> {
        self.record(ControlAction::MoveCursor { x, y });
        Ok(())
    }

    fn click(&mut self, button: MouseButton, double: bool) -> DomainResult<()> {
        self.record(ControlAction::Click { button, double });
        Ok(())
    }

    fn scroll(&mut self, amount: i32) -> DomainResult<()> {
        self.record(ControlAction::Scroll { amount });
        Ok(())
    }

    fn key_tap(&mut self, key: &str) -> DomainResult<()> {
        self.record(ControlAction::KeyTap {
            key: key.to_string(),
        });
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> DomainResult<()> {
        tracing::debug!("MockControl: type_text({:?})", text);
        Ok(())
    }
}
