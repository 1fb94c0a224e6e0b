/// ジェスチャー分類
///
/// 21点のランドマーク座標に対する閾値比較だけでラベルを決める純粋関数群。
/// 同じ入力には必ず同じラベルを返す（外部状態・乱数・時刻に依存しない）。

use crate::domain::types::{landmark, Gesture, HandLandmarks, Landmark};

/// 親指・人差し指の接触とみなすデフォルト距離（正規化座標）
pub const DEFAULT_PINCH_THRESHOLD: f32 = 0.03;

/// ピンチ強度の正規化に使う最大想定距離（正規化座標）
const PINCH_MAX_DISTANCE: f32 = 0.15;

/// 親指以外の指が伸展しているか
///
/// 画像座標系はy軸下向きのため、指先が第二関節より上（小さいy）なら伸展。
fn finger_extended(hand: &HandLandmarks, tip: usize, pip: usize) -> bool {
    hand.point(tip).y < hand.point(pip).y
}

/// 親指が伸展しているか
///
/// 親指は上下ではなく水平方向に開くため、手の向き（手首が指先のどちら側か）で
/// 比較方向を切り替える。ミラー映像でも同じ判定になる。
fn thumb_extended(hand: &HandLandmarks) -> bool {
    let wrist = hand.point(landmark::WRIST);
    let tip = hand.point(landmark::THUMB_TIP);
    let ip = hand.point(landmark::THUMB_IP);

    if wrist.x < tip.x {
        tip.x > ip.x
    } else {
        tip.x < ip.x
    }
}

/// 5指の伸展状態 [親指, 人差し指, 中指, 薬指, 小指]
pub fn extended_fingers(hand: &HandLandmarks) -> [bool; 5] {
    [
        thumb_extended(hand),
        finger_extended(hand, landmark::INDEX_TIP, landmark::INDEX_PIP),
        finger_extended(hand, landmark::MIDDLE_TIP, landmark::MIDDLE_PIP),
        finger_extended(hand, landmark::RING_TIP, landmark::RING_PIP),
        finger_extended(hand, landmark::PINKY_TIP, landmark::PINKY_PIP),
    ]
}

/// ランドマークからジェスチャーを分類
///
/// 伸展している指の本数と組み合わせによるフラットな分岐。
pub fn classify(hand: &HandLandmarks) -> Gesture {
    let [thumb, index, middle, ring, pinky] = extended_fingers(hand);
    let count = [thumb, index, middle, ring, pinky]
        .iter()
        .filter(|&&e| e)
        .count();

    match count {
        0 => Gesture::Fist,
        1 if index => Gesture::Point,
        1 if thumb => Gesture::ThumbsUp,
        2 if index && middle => Gesture::Peace,
        2 if index && thumb => Gesture::Ok,
        3 if index && middle && ring => Gesture::Three,
        4 if !thumb => Gesture::Four,
        5 => Gesture::OpenHand,
        _ => Gesture::Unknown,
    }
}

/// 親指先と人差し指先の距離（正規化座標、深度込み）
pub fn pinch_distance(hand: &HandLandmarks) -> f32 {
    hand.point(landmark::THUMB_TIP)
        .distance_to(hand.point(landmark::INDEX_TIP))
}

/// ピンチ強度 [0,1]（0.0 = 完全に閉じている、1.0 = 開いている）
#[allow(dead_code)]
pub fn pinch_strength(hand: &HandLandmarks) -> f32 {
    (pinch_distance(hand) / PINCH_MAX_DISTANCE).min(1.0)
}

/// ポインタ操作に使う人差し指先のランドマーク
pub fn index_tip(hand: &HandLandmarks) -> &Landmark {
    hand.point(landmark::INDEX_TIP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Handedness;

    /// 指定した指だけ伸展した合成ランドマークを作成
    ///
    /// fingers = [親指, 人差し指, 中指, 薬指, 小指]
    fn synthetic_hand(fingers: [bool; 5]) -> HandLandmarks {
        let mut points = [Landmark::default(); landmark::COUNT];

        // 手首は画面下中央
        points[landmark::WRIST] = Landmark::new(0.5, 0.95, 0.0);

        // 親指は水平展開: wrist.x < tip.x の側に配置
        let (thumb_ip_x, thumb_tip_x) = if fingers[0] { (0.65, 0.72) } else { (0.65, 0.60) };
        points[landmark::THUMB_CMC] = Landmark::new(0.55, 0.85, 0.0);
        points[landmark::THUMB_MCP] = Landmark::new(0.60, 0.80, 0.0);
        points[landmark::THUMB_IP] = Landmark::new(thumb_ip_x, 0.78, 0.0);
        points[landmark::THUMB_TIP] = Landmark::new(thumb_tip_x, 0.76, 0.0);

        // 親指以外: 伸展なら tip.y < pip.y、屈曲なら tip.y > pip.y
        let columns = [
            (landmark::INDEX_MCP, 0.42, fingers[1]),
            (landmark::MIDDLE_MCP, 0.48, fingers[2]),
            (landmark::RING_MCP, 0.54, fingers[3]),
            (landmark::PINKY_MCP, 0.60, fingers[4]),
        ];
        for (mcp, x, extended) in columns {
            points[mcp] = Landmark::new(x, 0.70, 0.0);
            points[mcp + 1] = Landmark::new(x, 0.60, 0.0); // PIP
            points[mcp + 2] = Landmark::new(x, if extended { 0.50 } else { 0.64 }, 0.0); // DIP
            points[mcp + 3] = Landmark::new(x, if extended { 0.40 } else { 0.68 }, 0.0); // TIP
        }

        HandLandmarks::new(points, Handedness::Right, 0.95)
    }

    #[test]
    fn test_classify_fist() {
        let hand = synthetic_hand([false; 5]);
        assert_eq!(classify(&hand), Gesture::Fist);
    }

    #[test]
    fn test_classify_point() {
        let hand = synthetic_hand([false, true, false, false, false]);
        assert_eq!(classify(&hand), Gesture::Point);
    }

    #[test]
    fn test_classify_thumbs_up() {
        let hand = synthetic_hand([true, false, false, false, false]);
        assert_eq!(classify(&hand), Gesture::ThumbsUp);
    }

    #[test]
    fn test_classify_peace() {
        let hand = synthetic_hand([false, true, true, false, false]);
        assert_eq!(classify(&hand), Gesture::Peace);
    }

    #[test]
    fn test_classify_ok() {
        let hand = synthetic_hand([true, true, false, false, false]);
        assert_eq!(classify(&hand), Gesture::Ok);
    }

    #[test]
    fn test_classify_three() {
        let hand = synthetic_hand([false, true, true, true, false]);
        assert_eq!(classify(&hand), Gesture::Three);
    }

    #[test]
    fn test_classify_four() {
        let hand = synthetic_hand([false, true, true, true, true]);
        assert_eq!(classify(&hand), Gesture::Four);
    }

    #[test]
    fn test_classify_open_hand() {
        let hand = synthetic_hand([true; 5]);
        assert_eq!(classify(&hand), Gesture::OpenHand);
    }

    #[test]
    fn test_classify_unmatched_combination() {
        // 中指 + 小指のような組み合わせはどのテンプレートにも一致しない
        let hand = synthetic_hand([false, false, true, false, true]);
        assert_eq!(classify(&hand), Gesture::Unknown);
    }

    #[test]
    fn test_classify_is_deterministic() {
        // 同じ入力 → 同じラベル
        let hand = synthetic_hand([false, true, false, false, false]);
        let first = classify(&hand);
        for _ in 0..10 {
            assert_eq!(classify(&hand), first);
        }
    }

    #[test]
    fn test_thumb_extended_mirrored() {
        // 手首が指先より右にあるケース（左手・非ミラー）でも判定が反転しない
        let mut hand = synthetic_hand([true, false, false, false, false]);
        for p in hand.points.iter_mut() {
            p.x = 1.0 - p.x;
        }
        assert_eq!(classify(&hand), Gesture::ThumbsUp);
    }

    #[test]
    fn test_pinch_distance_and_strength() {
        let mut hand = synthetic_hand([true, true, false, false, false]);

        // 指先を重ねるとピンチ距離はほぼ0
        hand.points[landmark::THUMB_TIP] = Landmark::new(0.5, 0.5, 0.0);
        hand.points[landmark::INDEX_TIP] = Landmark::new(0.5, 0.5, 0.0);
        assert!(pinch_distance(&hand) < DEFAULT_PINCH_THRESHOLD);
        assert!(pinch_strength(&hand) < 0.05);

        // 大きく離すと強度は1.0に飽和
        hand.points[landmark::INDEX_TIP] = Landmark::new(0.9, 0.1, 0.0);
        assert!((pinch_strength(&hand) - 1.0).abs() < f32::EPSILON);
    }
}
