//! カメラ再オープンロジックモジュール
//!
//! フレームの連続取りこぼしを監視し、指数バックオフでカメラの
//! 再オープンを制御します。

use std::time::{Duration, Instant};

/// 再オープン戦略
#[derive(Debug, Clone)]
pub struct RecoveryPolicy {
    /// 連続取りこぼし閾値（この回数を超えたら再オープン）
    pub consecutive_miss_threshold: u32,
    /// 初期バックオフ時間
    pub initial_backoff: Duration,
    /// 最大バックオフ時間
    pub max_backoff: Duration,
    /// 累積失敗時間の上限（これを超えたら致命的エラー）
    pub max_cumulative_failure: Duration,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            consecutive_miss_threshold: 90, // 約3秒 @ 30fps
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            max_cumulative_failure: Duration::from_secs(60),
        }
    }
}

/// カメラ再オープン状態管理
#[derive(Debug)]
pub struct CameraRecovery {
    policy: RecoveryPolicy,
    consecutive_misses: u32,
    current_backoff: Duration,
    cumulative_failure_start: Option<Instant>,
    total_reopens: u64,
}

impl CameraRecovery {
    /// 新しいCameraRecoveryを作成
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self {
            current_backoff: policy.initial_backoff,
            policy,
            consecutive_misses: 0,
            cumulative_failure_start: None,
            total_reopens: 0,
        }
    }

    /// デフォルト戦略でCameraRecoveryを作成
    #[allow(dead_code)]
    pub fn with_default_policy() -> Self {
        Self::new(RecoveryPolicy::default())
    }

    /// フレーム取りこぼしを記録
    ///
    /// # Returns
    /// 再オープンが必要な場合は true
    pub fn record_miss(&mut self) -> bool {
        self.consecutive_misses += 1;

        if self.consecutive_misses >= self.policy.consecutive_miss_threshold {
            self.consecutive_misses = 0;
            true
        } else {
            false
        }
    }

    /// フレーム取得成功を記録（連続取りこぼしカウンターをリセット）
    pub fn record_success(&mut self) {
        self.consecutive_misses = 0;
        self.current_backoff = self.policy.initial_backoff;
        self.cumulative_failure_start = None;
    }

    /// 再オープン試行を記録
    ///
    /// バックオフ時間を2倍にし（上限あり）、累積失敗時間の計測を開始する。
    pub fn record_reopen_attempt(&mut self) {
        self.total_reopens += 1;

        self.current_backoff = (self.current_backoff * 2).min(self.policy.max_backoff);

        if self.cumulative_failure_start.is_none() {
            self.cumulative_failure_start = Some(Instant::now());
        }
    }

    /// 現在のバックオフ時間を取得
    pub fn current_backoff(&self) -> Duration {
        self.current_backoff
    }

    /// 累積失敗時間を取得
    ///
    /// # Returns
    /// 累積失敗時間。失敗していない場合は None
    pub fn cumulative_failure_duration(&self) -> Option<Duration> {
        self.cumulative_failure_start.map(|start| start.elapsed())
    }

    /// 累積失敗時間が上限を超えたか判定
    pub fn is_cumulative_failure_exceeded(&self) -> bool {
        match self.cumulative_failure_duration() {
            Some(duration) => duration >= self.policy.max_cumulative_failure,
            None => false,
        }
    }

    /// 総再オープン回数を取得
    pub fn total_reopens(&self) -> u64 {
        self.total_reopens
    }

    /// 連続取りこぼし回数を取得
    #[allow(dead_code)]
    pub fn consecutive_misses(&self) -> u32 {
        self.consecutive_misses
    }
}
