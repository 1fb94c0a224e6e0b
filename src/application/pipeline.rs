//! 制御ループモジュール
//!
//! キャプチャ → ランドマーク検出 → ジェスチャー分類 → OS入力注入 を
//! 1フレームずつ同期的に回す単一スレッドのポーリングループ。
//!
//! # エラー方針
//! - フレーム取りこぼし: recoveryに記録し、閾値超過でカメラを再オープン
//! - トラッカーエラー: ログを出してそのフレームをスキップ
//! - 注入エラー: ログを出して継続（ベストエフォート）

use std::time::Instant;

use crate::application::controller::GestureController;
use crate::application::recovery::CameraRecovery;
use crate::application::stats::{StatKind, StatsCollector};
use crate::domain::{
    apply_action, CapturePort, ControlPort, DomainError, DomainResult, Frame, Gesture,
    HandLandmarks, TrackerPort,
};

/// 1フレーム分の処理結果
///
/// プレビュー描画と統計のためにループの外へ返す。
#[derive(Debug)]
pub struct TickReport {
    /// キャプチャされたフレーム（取りこぼし時はNone）
    pub frame: Option<Frame>,
    /// 検出された手
    pub hands: Vec<HandLandmarks>,
    /// このフレームのジェスチャーラベル
    pub gesture: Gesture,
    /// ポインタ操作中か
    pub pointer_active: bool,
    /// 実行されたアクション数
    pub actions_applied: usize,
}

impl TickReport {
    /// フレームが得られなかったサイクルのレポート
    fn missed() -> Self {
        Self {
            frame: None,
            hands: Vec::new(),
            gesture: Gesture::None,
            pointer_active: false,
            actions_applied: 0,
        }
    }
}

/// 制御ループ
///
/// 3つのポート（キャプチャ・トラッカー・コントロール）を所有し、
/// tick()ごとに1フレームを処理する。
pub struct ControlLoop<C, T, K>
where
    C: CapturePort,
    T: TrackerPort,
    K: ControlPort,
{
    capture: C,
    tracker: T,
    control: K,
    controller: GestureController,
    recovery: CameraRecovery,
    stats: StatsCollector,
}

impl<C, T, K> ControlLoop<C, T, K>
where
    C: CapturePort,
    T: TrackerPort,
    K: ControlPort,
{
    /// 新しいControlLoopを作成
    pub fn new(
        capture: C,
        tracker: T,
        control: K,
        controller: GestureController,
        recovery: CameraRecovery,
        stats: StatsCollector,
    ) -> Self {
        Self {
            capture,
            tracker,
            control,
            controller,
            recovery,
            stats,
        }
    }

    /// 1フレーム分の処理
    ///
    /// # Returns
    /// - `Ok(TickReport)`: 処理結果（取りこぼし時も正常）
    /// - `Err(DomainError)`: カメラが累積失敗上限を超えて復旧しない場合のみ
    pub fn tick(&mut self) -> DomainResult<TickReport> {
        let started = Instant::now();

        // --- キャプチャ ---
        let frame = match self.capture.capture_frame() {
            Ok(Some(frame)) => {
                self.recovery.record_success();
                frame
            }
            Ok(None) => {
                return self.handle_miss(None);
            }
            Err(e) => {
                return self.handle_miss(Some(e));
            }
        };
        let captured_at = Instant::now();
        self.stats
            .record_duration(StatKind::Capture, captured_at.duration_since(started));

        // --- ランドマーク検出 ---
        let hands = match self.tracker.detect_hands(&frame) {
            Ok(hands) => hands,
            Err(e) => {
                tracing::warn!("Tracker error, skipping frame: {:?}", e);
                return Ok(TickReport {
                    frame: Some(frame),
                    ..TickReport::missed()
                });
            }
        };
        let tracked_at = Instant::now();
        self.stats
            .record_duration(StatKind::Track, tracked_at.duration_since(captured_at));

        // --- 分類 + コントローラ更新 ---
        let update = self.controller.update(hands.first(), tracked_at);
        let classified_at = Instant::now();
        self.stats
            .record_duration(StatKind::Classify, classified_at.duration_since(tracked_at));

        // --- OS入力注入 ---
        let mut applied = 0;
        for action in &update.actions {
            match apply_action(&mut self.control, action) {
                Ok(()) => applied += 1,
                Err(e) => {
                    tracing::warn!("Failed to apply {:?}: {:?}", action, e);
                }
            }
        }
        let injected_at = Instant::now();
        self.stats
            .record_duration(StatKind::Inject, injected_at.duration_since(classified_at));
        self.stats
            .record_duration(StatKind::EndToEnd, injected_at.duration_since(started));
        self.stats.record_frame();

        if self.stats.should_report() {
            self.stats.report_and_reset();
        }

        Ok(TickReport {
            frame: Some(frame),
            hands,
            gesture: update.gesture,
            pointer_active: update.pointer_active,
            actions_applied: applied,
        })
    }

    /// フレーム取りこぼし時の処理
    ///
    /// 閾値超過でバックオフ待機の上カメラを再オープンする。
    /// 累積失敗時間が上限を超えた場合のみErrを返す。
    fn handle_miss(&mut self, error: Option<DomainError>) -> DomainResult<TickReport> {
        if let Some(e) = error {
            tracing::warn!("Capture error: {:?}", e);
        }

        self.controller.on_hand_lost();

        if self.recovery.record_miss() {
            let backoff = self.recovery.current_backoff();
            tracing::warn!(
                "Too many consecutive capture misses, reopening camera in {:?} (attempt #{})",
                backoff,
                self.recovery.total_reopens() + 1
            );
            std::thread::sleep(backoff);
            self.recovery.record_reopen_attempt();
            self.stats.record_reopen();

            if let Err(e) = self.capture.reinitialize() {
                tracing::error!("Camera reopen failed: {:?}", e);
            }
        }

        if self.recovery.is_cumulative_failure_exceeded() {
            return Err(DomainError::Capture(
                "Camera did not recover within the failure budget".to_string(),
            ));
        }

        Ok(TickReport::missed())
    }

    /// コントローラの状態をリセット（プレビューの'r'キー）
    pub fn reset_controller(&mut self) {
        self.controller.reset();
        tracing::info!("Controller state reset");
    }
}
