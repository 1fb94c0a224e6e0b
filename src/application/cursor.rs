//! カーソル座標変換モジュール
//!
//! 正規化されたランドマーク座標をスクリーンピクセル座標へ写像し、
//! 指数移動平均（EMA）でジッタを抑える。

/// 指数移動平均フィルタ（2次元）
///
/// `smoothed = alpha * new + (1 - alpha) * prev`
/// alphaは新しいサンプルの重み。同一入力を繰り返すと単調に収束する。
#[derive(Debug, Clone)]
pub struct EmaFilter {
    alpha: f32,
    state: Option<(f32, f32)>,
}

impl EmaFilter {
    /// 新しいEMAフィルタを作成
    ///
    /// # Arguments
    /// * `alpha` - 新サンプルの重み (0,1]。1.0で平滑化なし
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(f32::EPSILON, 1.0),
            state: None,
        }
    }

    /// サンプルを適用して平滑化後の値を返す
    ///
    /// 初回サンプルはそのまま採用する。
    pub fn apply(&mut self, x: f32, y: f32) -> (f32, f32) {
        let next = match self.state {
            Some((px, py)) => (
                self.alpha * x + (1.0 - self.alpha) * px,
                self.alpha * y + (1.0 - self.alpha) * py,
            ),
            None => (x, y),
        };
        self.state = Some(next);
        next
    }

    /// 状態をリセット（次のサンプルが初回扱いになる）
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// 現在の平滑化後の位置
    #[allow(dead_code)]
    pub fn current(&self) -> Option<(f32, f32)> {
        self.state
    }
}

/// フレーム空間→スクリーン空間の座標マッパー
///
/// 正規化座標[0,1]をスクリーンピクセルへ拡大し、EMA平滑化の上で
/// 画面境界にクランプする。
#[derive(Debug, Clone)]
pub struct CursorMapper {
    screen_width: u32,
    screen_height: u32,
    /// x軸を反転するか
    ///
    /// フレームがミラー（鏡像）で取り込まれていない場合にtrueにすると、
    /// 手を右へ動かすとカーソルも右へ動く。
    flip_x: bool,
    filter: EmaFilter,
}

impl CursorMapper {
    /// 新しいマッパーを作成
    pub fn new(screen_width: u32, screen_height: u32, flip_x: bool, smoothing: f32) -> Self {
        Self {
            screen_width,
            screen_height,
            flip_x,
            filter: EmaFilter::new(smoothing),
        }
    }

    /// 正規化座標をスクリーン座標へ写像
    ///
    /// # Arguments
    /// * `norm_x`, `norm_y` - フレーム空間の正規化座標 [0,1]
    ///
    /// # Returns
    /// 平滑化・クランプ済みのスクリーンピクセル座標
    pub fn map(&mut self, norm_x: f32, norm_y: f32) -> (i32, i32) {
        let nx = if self.flip_x { 1.0 - norm_x } else { norm_x };

        let raw_x = nx * self.screen_width as f32;
        let raw_y = norm_y * self.screen_height as f32;

        let (sx, sy) = self.filter.apply(raw_x, raw_y);

        let clamped_x = sx.clamp(0.0, (self.screen_width - 1) as f32);
        let clamped_y = sy.clamp(0.0, (self.screen_height - 1) as f32);

        (clamped_x as i32, clamped_y as i32)
    }

    /// 平滑化状態をリセット
    pub fn reset(&mut self) {
        self.filter.reset();
    }
}
