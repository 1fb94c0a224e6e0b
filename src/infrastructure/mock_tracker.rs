/// モックトラッカーアダプタ
///
/// テスト・開発用のランドマーク検出モック実装。
/// Python環境なしでパイプライン全体を動かすために、合成ランドマークを返す。

use crate::domain::types::{landmark, Handedness, Landmark};
use crate::domain::{DomainResult, Frame, HandLandmarks, TrackerPort};

/// 指定した指だけ伸展した合成ランドマークを作成
///
/// fingers = [親指, 人差し指, 中指, 薬指, 小指]。
/// 分類器の幾何条件（tip/pip比較、親指の水平判定）を満たす配置。
pub fn synthetic_hand(fingers: [bool; 5]) -> HandLandmarks {
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

/// 人差し指だけ伸展した手（POINT）
pub fn pointing_hand() -> HandLandmarks {
    synthetic_hand([false, true, false, false, false])
}

/// 全指屈曲の手（FIST）
#[allow(dead_code)]
pub fn fist_hand() -> HandLandmarks {
    synthetic_hand([false; 5])
}

/// 親指先と人差し指先を近づけた手（ピンチ、分類上はFISTのまま）
#[allow(dead_code)]
pub fn pinched_hand() -> HandLandmarks {
    let mut hand = fist_hand();
    hand.points[landmark::THUMB_TIP] = Landmark::new(0.60, 0.64, 0.0);
    hand.points[landmark::INDEX_TIP] = Landmark::new(0.60, 0.62, 0.0);
    hand
}

/// モックトラッカーアダプタ
///
/// デフォルトでは常にPOINTの手を1つ返す。`with_script`でフレームごとの
/// 応答列を与えると、それを順に返す（末尾以降は繰り返し）。
pub struct MockTrackerAdapter {
    script: Vec<Vec<HandLandmarks>>,
    cursor: usize,
}

impl MockTrackerAdapter {
    /// 常にPOINTの手を返すモックを作成
    pub fn new() -> Self {
        Self {
            script: vec![vec![pointing_hand()]],
            cursor: 0,
        }
    }

    /// フレームごとの応答列を指定してモックを作成
    #[allow(dead_code)]
    pub fn with_script(script: Vec<Vec<HandLandmarks>>) -> Self {
        Self { script, cursor: 0 }
    }
}

impl Default for MockTrackerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerPort for MockTrackerAdapter {
    fn detect_hands(&mut self, _frame: &Frame) -> DomainResult<Vec<HandLandmarks>> {
        let hands = self.script[self.cursor % self.script.len()].clone();
        self.cursor += 1;
        Ok(hands)
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gesture;
    use crate::domain::Gesture;

    #[test]
    fn test_synthetic_hands_classify_as_expected() {
        assert_eq!(gesture::classify(&pointing_hand()), Gesture::Point);
        assert_eq!(gesture::classify(&fist_hand()), Gesture::Fist);
        assert!(gesture::pinch_distance(&pinched_hand()) < gesture::DEFAULT_PINCH_THRESHOLD);
    }

    #[test]
    fn test_script_cycles() {
        let mut tracker =
            MockTrackerAdapter::with_script(vec![vec![pointing_hand()], Vec::new()]);
        let frame = Frame::new(vec![0u8; 3], 1, 1);

        assert_eq!(tracker.detect_hands(&frame).unwrap().len(), 1);
        assert!(tracker.detect_hands(&frame).unwrap().is_empty());
        // 末尾まで来たら先頭へ戻る
        assert_eq!(tracker.detect_hands(&frame).unwrap().len(), 1);
    }
}
