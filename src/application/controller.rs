//! ジェスチャー→アクション変換（Application層）
//!
//! 分類済みジェスチャーとランドマークから、実行すべきControlActionの列を
//! 決定する状態機械。ホールド時間・クールダウン・ピンチのエッジ検出を管理する。
//!
//! 時刻は引数で受け取るため、テストでは任意の時刻を与えられる。

use std::time::{Duration, Instant};

use crate::application::cursor::CursorMapper;
use crate::domain::config::{ActionBinding, ActionsConfig, ControlConfig, ControlMode};
use crate::domain::gesture;
use crate::domain::{ControlAction, Gesture, HandLandmarks};

/// ピンチ状態の立ち上がりエッジ検出
///
/// 前回の状態と比較して、ピンチが閉じた瞬間のみを検知する。
/// 閉じ続けている間は発火しない。
#[derive(Debug, Default)]
struct PinchDetector {
    previous: bool,
}

impl PinchDetector {
    /// 今回の状態を与え、立ち上がりエッジならtrueを返す
    fn rising_edge(&mut self, current: bool) -> bool {
        let edge = !self.previous && current;
        self.previous = current;
        edge
    }

    fn reset(&mut self) {
        self.previous = false;
    }
}

/// コントローラの1フレーム分の出力
#[derive(Debug)]
pub struct ControllerUpdate {
    /// このフレームのジェスチャーラベル
    pub gesture: Gesture,
    /// 実行すべきアクション
    pub actions: Vec<ControlAction>,
    /// ポインタ操作中か（プレビュー表示用）
    pub pointer_active: bool,
}

/// ジェスチャーコントローラ
///
/// フレームごとに呼び出され、ポインタ移動・ピンチクリック・
/// ホールドジェスチャーのアクションを決定する。
pub struct GestureController {
    mode: ControlMode,
    actions: ActionsConfig,
    mapper: CursorMapper,

    click_threshold: f32,
    click_cooldown: Duration,
    hold_click_window: (Duration, Duration),
    hold_scroll: Duration,
    scroll_repeat: Duration,
    hold_reset: Duration,

    pinch: PinchDetector,
    pointer_active: bool,
    last_click_at: Option<Instant>,

    current_gesture: Gesture,
    gesture_since: Option<Instant>,
    hold_fired: bool,
    last_scroll_at: Option<Instant>,
}

impl GestureController {
    /// 新しいコントローラを作成
    ///
    /// # Arguments
    /// * `control` - 制御設定（モード・閾値・ホールド時間）
    /// * `actions` - ジェスチャーとアクションの対応表
    /// * `mapper` - フレーム→スクリーンの座標マッパー
    pub fn new(control: &ControlConfig, actions: ActionsConfig, mapper: CursorMapper) -> Self {
        Self {
            mode: control.mode,
            actions,
            mapper,
            click_threshold: control.click_threshold,
            click_cooldown: control.click_cooldown(),
            hold_click_window: control.hold_click_window(),
            hold_scroll: control.hold_scroll(),
            scroll_repeat: control.scroll_repeat(),
            hold_reset: control.hold_reset(),
            pinch: PinchDetector::default(),
            pointer_active: false,
            last_click_at: None,
            current_gesture: Gesture::None,
            gesture_since: None,
            hold_fired: false,
            last_scroll_at: None,
        }
    }

    /// 1フレーム分の更新
    ///
    /// 手が検出されなかったフレームでは`None`を渡す。
    pub fn update(&mut self, hand: Option<&HandLandmarks>, now: Instant) -> ControllerUpdate {
        let hand = match hand {
            Some(hand) => hand,
            None => {
                self.on_hand_lost();
                return ControllerUpdate {
                    gesture: Gesture::None,
                    actions: Vec::new(),
                    pointer_active: false,
                };
            }
        };

        let label = gesture::classify(hand);
        let mut actions = Vec::new();

        if self.mode.pointer_enabled() {
            self.update_pointer(hand, label, now, &mut actions);
        }

        if self.mode.gesture_enabled() {
            self.update_gesture_hold(label, now, &mut actions);
        }

        ControllerUpdate {
            gesture: label,
            actions,
            pointer_active: self.pointer_active,
        }
    }

    /// 手を見失ったときの状態クリア
    pub fn on_hand_lost(&mut self) {
        self.pointer_active = false;
        self.pinch.reset();
        self.current_gesture = Gesture::None;
        self.gesture_since = None;
        self.hold_fired = false;
        self.last_scroll_at = None;
    }

    /// 全状態のリセット（プレビューの'r'キー）
    pub fn reset(&mut self) {
        self.on_hand_lost();
        self.mapper.reset();
        self.last_click_at = None;
    }

    /// ポインタモード: 人差し指でカーソル移動、ピンチでクリック
    fn update_pointer(
        &mut self,
        hand: &HandLandmarks,
        label: Gesture,
        now: Instant,
        actions: &mut Vec<ControlAction>,
    ) {
        if label == Gesture::Point {
            let tip = gesture::index_tip(hand);
            let (x, y) = self.mapper.map(tip.x, tip.y);
            actions.push(ControlAction::MoveCursor { x, y });
            self.pointer_active = true;
        } else {
            self.pointer_active = false;
        }

        // ピンチクリック: 閉じた瞬間のみ発火（ホールドで連打しない）
        let pinched = gesture::pinch_distance(hand) < self.click_threshold;
        if self.pinch.rising_edge(pinched) && self.cooldown_elapsed(now) {
            actions.push(ControlAction::Click {
                button: crate::domain::MouseButton::Left,
                double: false,
            });
            self.last_click_at = Some(now);
        }
    }

    /// ジェスチャーモード: ホールド時間に応じてバインディングを発火
    fn update_gesture_hold(
        &mut self,
        label: Gesture,
        now: Instant,
        actions: &mut Vec<ControlAction>,
    ) {
        // ジェスチャーが変わったらホールド計測をやり直す
        if label != self.current_gesture {
            self.current_gesture = label;
            self.gesture_since = Some(now);
            self.hold_fired = false;
            self.last_scroll_at = None;
            return;
        }

        let since = match self.gesture_since {
            Some(t) => t,
            None => {
                self.gesture_since = Some(now);
                return;
            }
        };
        let held = now.duration_since(since);

        let binding = match self.actions.binding_for(label) {
            Some(binding) => binding.clone(),
            None => return,
        };

        match binding {
            ActionBinding::Click { button, double } => {
                let (min, max) = self.hold_click_window;
                if held >= min && held < max && !self.hold_fired && self.cooldown_elapsed(now) {
                    actions.push(ControlAction::Click {
                        button: button.into(),
                        double,
                    });
                    self.last_click_at = Some(now);
                    self.hold_fired = true;
                }
            }
            ActionBinding::Scroll { amount } => {
                if held >= self.hold_scroll && self.scroll_due(now) {
                    actions.push(ControlAction::Scroll { amount });
                    self.last_scroll_at = Some(now);
                }
            }
            ActionBinding::Key { key } => {
                let (min, max) = self.hold_click_window;
                if held >= min && held < max && !self.hold_fired {
                    actions.push(ControlAction::KeyTap { key });
                    self.hold_fired = true;
                }
            }
            ActionBinding::Reset => {
                if held >= self.hold_reset && !self.hold_fired {
                    self.mapper.reset();
                    self.pointer_active = false;
                    self.hold_fired = true;
                }
            }
            ActionBinding::None => {}
        }
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.last_click_at {
            Some(last) => now.duration_since(last) >= self.click_cooldown,
            None => true,
        }
    }

    fn scroll_due(&self, now: Instant) -> bool {
        match self.last_scroll_at {
            Some(last) => now.duration_since(last) >= self.scroll_repeat,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{landmark, Handedness, Landmark, MouseButton};

    /// 指定した指だけ伸展した合成ランドマークを作成
    /// fingers = [親指, 人差し指, 中指, 薬指, 小指]
    fn synthetic_hand(fingers: [bool; 5]) -> HandLandmarks {
        let mut points = [Landmark::default(); landmark::COUNT];
        points[landmark::WRIST] = Landmark::new(0.5, 0.95, 0.0);

        let (thumb_ip_x, thumb_tip_x) = if fingers[0] { (0.65, 0.72) } else { (0.65, 0.60) };
        points[landmark::THUMB_CMC] = Landmark::new(0.55, 0.85, 0.0);
        points[landmark::THUMB_MCP] = Landmark::new(0.60, 0.80, 0.0);
        points[landmark::THUMB_IP] = Landmark::new(thumb_ip_x, 0.78, 0.0);
        points[landmark::THUMB_TIP] = Landmark::new(thumb_tip_x, 0.76, 0.0);

        let columns = [
            (landmark::INDEX_MCP, 0.42, fingers[1]),
            (landmark::MIDDLE_MCP, 0.48, fingers[2]),
            (landmark::RING_MCP, 0.54, fingers[3]),
            (landmark::PINKY_MCP, 0.60, fingers[4]),
        ];
        for (mcp, x, extended) in columns {
            points[mcp] = Landmark::new(x, 0.70, 0.0);
            points[mcp + 1] = Landmark::new(x, 0.60, 0.0);
            points[mcp + 2] = Landmark::new(x, if extended { 0.50 } else { 0.64 }, 0.0);
            points[mcp + 3] = Landmark::new(x, if extended { 0.40 } else { 0.68 }, 0.0);
        }

        HandLandmarks::new(points, Handedness::Right, 0.95)
    }

    fn pointing_hand() -> HandLandmarks {
        synthetic_hand([false, true, false, false, false])
    }

    fn fist_hand() -> HandLandmarks {
        synthetic_hand([false; 5])
    }

    /// ピンチ状態（親指先と人差し指先を重ねた手）
    fn pinched_hand() -> HandLandmarks {
        let mut hand = synthetic_hand([false, false, true, true, true]);
        hand.points[landmark::THUMB_TIP] = Landmark::new(0.45, 0.55, 0.0);
        hand.points[landmark::INDEX_TIP] = Landmark::new(0.45, 0.56, 0.0);
        hand
    }

    fn controller(mode: ControlMode) -> GestureController {
        let control = ControlConfig {
            mode,
            ..ControlConfig::default()
        };
        let mapper = CursorMapper::new(1920, 1080, false, 1.0);
        GestureController::new(&control, ActionsConfig::default(), mapper)
    }

    #[test]
    fn test_point_moves_cursor() {
        let mut ctrl = controller(ControlMode::Pointer);
        let now = Instant::now();

        let update = ctrl.update(Some(&pointing_hand()), now);
        assert_eq!(update.gesture, Gesture::Point);
        assert!(update.pointer_active);
        assert!(matches!(
            update.actions.as_slice(),
            [ControlAction::MoveCursor { .. }]
        ));
    }

    #[test]
    fn test_no_hand_yields_no_actions() {
        let mut ctrl = controller(ControlMode::Both);
        let update = ctrl.update(None, Instant::now());
        assert_eq!(update.gesture, Gesture::None);
        assert!(update.actions.is_empty());
        assert!(!update.pointer_active);
    }

    #[test]
    fn test_pinch_clicks_once_on_edge() {
        let mut ctrl = controller(ControlMode::Pointer);
        let t0 = Instant::now();

        // 閉じた瞬間に1回だけクリック
        let update = ctrl.update(Some(&pinched_hand()), t0);
        assert!(update
            .actions
            .iter()
            .any(|a| matches!(a, ControlAction::Click { button: MouseButton::Left, double: false })));

        // 閉じ続けても発火しない
        let update = ctrl.update(Some(&pinched_hand()), t0 + Duration::from_millis(33));
        assert!(!update
            .actions
            .iter()
            .any(|a| matches!(a, ControlAction::Click { .. })));
    }

    #[test]
    fn test_pinch_respects_cooldown() {
        let mut ctrl = controller(ControlMode::Pointer);
        let t0 = Instant::now();

        ctrl.update(Some(&pinched_hand()), t0);

        // 一度開いてすぐ閉じ直してもクールダウン中は発火しない
        ctrl.update(Some(&pointing_hand()), t0 + Duration::from_millis(100));
        let update = ctrl.update(Some(&pinched_hand()), t0 + Duration::from_millis(200));
        assert!(!update
            .actions
            .iter()
            .any(|a| matches!(a, ControlAction::Click { .. })));

        // クールダウン経過後は再び発火する
        ctrl.update(Some(&pointing_hand()), t0 + Duration::from_millis(400));
        let update = ctrl.update(Some(&pinched_hand()), t0 + Duration::from_millis(500));
        assert!(update
            .actions
            .iter()
            .any(|a| matches!(a, ControlAction::Click { .. })));
    }

    #[test]
    fn test_fist_hold_fires_right_click_once() {
        let mut ctrl = controller(ControlMode::Gesture);
        let t0 = Instant::now();

        // ホールド開始
        ctrl.update(Some(&fist_hand()), t0);

        // 発火窓の手前では何も起きない
        let update = ctrl.update(Some(&fist_hand()), t0 + Duration::from_millis(900));
        assert!(update.actions.is_empty());

        // 窓内で1回発火
        let update = ctrl.update(Some(&fist_hand()), t0 + Duration::from_millis(1100));
        assert_eq!(
            update.actions,
            vec![ControlAction::Click {
                button: MouseButton::Right,
                double: false
            }]
        );

        // 同じホールド中は再発火しない
        let update = ctrl.update(Some(&fist_hand()), t0 + Duration::from_millis(1300));
        assert!(update.actions.is_empty());
    }

    #[test]
    fn test_hold_window_expires() {
        let mut ctrl = controller(ControlMode::Gesture);
        let t0 = Instant::now();

        ctrl.update(Some(&fist_hand()), t0);

        // 発火窓を過ぎてからの最初の評価では発火しない
        let update = ctrl.update(Some(&fist_hand()), t0 + Duration::from_millis(1600));
        assert!(update.actions.is_empty());
    }

    #[test]
    fn test_scroll_repeats_at_interval() {
        let mut ctrl = controller(ControlMode::Gesture);
        let t0 = Instant::now();
        let thumbs_up = synthetic_hand([true, false, false, false, false]);

        ctrl.update(Some(&thumbs_up), t0);

        // ホールド閾値到達で初回スクロール
        let update = ctrl.update(Some(&thumbs_up), t0 + Duration::from_millis(850));
        assert_eq!(update.actions, vec![ControlAction::Scroll { amount: 3 }]);

        // 繰り返し間隔の手前では発火しない
        let update = ctrl.update(Some(&thumbs_up), t0 + Duration::from_millis(900));
        assert!(update.actions.is_empty());

        // 間隔経過で再発火
        let update = ctrl.update(Some(&thumbs_up), t0 + Duration::from_millis(1050));
        assert_eq!(update.actions, vec![ControlAction::Scroll { amount: 3 }]);
    }

    #[test]
    fn test_gesture_change_restarts_hold() {
        let mut ctrl = controller(ControlMode::Gesture);
        let t0 = Instant::now();

        ctrl.update(Some(&fist_hand()), t0);
        // 別のジェスチャーに変わるとホールドがやり直しになる
        ctrl.update(Some(&pointing_hand()), t0 + Duration::from_millis(600));
        ctrl.update(Some(&fist_hand()), t0 + Duration::from_millis(700));

        // 元のホールド開始から1.1秒でも、再開直後なので発火しない
        let update = ctrl.update(Some(&fist_hand()), t0 + Duration::from_millis(1100));
        assert!(update.actions.is_empty());
    }

    #[test]
    fn test_key_binding_fires() {
        let control = ControlConfig {
            mode: ControlMode::Gesture,
            ..ControlConfig::default()
        };
        let actions = ActionsConfig {
            fist: ActionBinding::Key {
                key: "escape".to_string(),
            },
            ..ActionsConfig::default()
        };
        let mapper = CursorMapper::new(1920, 1080, false, 1.0);
        let mut ctrl = GestureController::new(&control, actions, mapper);

        let t0 = Instant::now();
        ctrl.update(Some(&fist_hand()), t0);
        let update = ctrl.update(Some(&fist_hand()), t0 + Duration::from_millis(1100));
        assert_eq!(
            update.actions,
            vec![ControlAction::KeyTap {
                key: "escape".to_string()
            }]
        );
    }

    #[test]
    fn test_open_hand_reset_clears_pointer() {
        let mut ctrl = controller(ControlMode::Both);
        let t0 = Instant::now();
        let open = synthetic_hand([true; 5]);

        // ポインタを動かしてから
        ctrl.update(Some(&pointing_hand()), t0);

        // OPEN_HANDをホールドするとリセット（アクションは出ない）
        ctrl.update(Some(&open), t0 + Duration::from_millis(100));
        let update = ctrl.update(Some(&open), t0 + Duration::from_millis(700));
        assert!(update.actions.is_empty());
        assert!(!update.pointer_active);
    }

    #[test]
    fn test_mode_gates_pointer_and_gesture() {
        // gestureモードではポインタ移動が出ない
        let mut ctrl = controller(ControlMode::Gesture);
        let update = ctrl.update(Some(&pointing_hand()), Instant::now());
        assert!(update.actions.is_empty());
        assert!(!update.pointer_active);

        // pointerモードではホールドアクションが出ない
        let mut ctrl = controller(ControlMode::Pointer);
        let t0 = Instant::now();
        ctrl.update(Some(&fist_hand()), t0);
        let update = ctrl.update(Some(&fist_hand()), t0 + Duration::from_millis(1100));
        assert!(update.actions.is_empty());
    }
}
