/// プレビューウィンドウモジュール
///
/// OpenCV highguiを使用したカメラプレビューとオーバーレイ描画。
/// 手のスケルトン、ジェスチャーラベル、モード、操作ガイドを表示し、
/// キー入力（終了・リセット)を拾う。

use crate::domain::config::ControlMode;
use crate::domain::types::landmark;
use crate::domain::{DomainError, DomainResult, Frame, Gesture, HandLandmarks};
use opencv::{
    core::{Mat, Point, Scalar},
    highgui,
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};

/// 手のスケルトン接続（MediaPipe HAND_CONNECTIONS準拠、21本）
const HAND_SKELETON: [(usize, usize); 21] = [
    // 親指
    (landmark::WRIST, landmark::THUMB_CMC),
    (landmark::THUMB_CMC, landmark::THUMB_MCP),
    (landmark::THUMB_MCP, landmark::THUMB_IP),
    (landmark::THUMB_IP, landmark::THUMB_TIP),
    // 人差し指
    (landmark::WRIST, landmark::INDEX_MCP),
    (landmark::INDEX_MCP, landmark::INDEX_PIP),
    (landmark::INDEX_PIP, landmark::INDEX_DIP),
    (landmark::INDEX_DIP, landmark::INDEX_TIP),
    // 中指
    (landmark::MIDDLE_MCP, landmark::MIDDLE_PIP),
    (landmark::MIDDLE_PIP, landmark::MIDDLE_DIP),
    (landmark::MIDDLE_DIP, landmark::MIDDLE_TIP),
    // 薬指
    (landmark::RING_MCP, landmark::RING_PIP),
    (landmark::RING_PIP, landmark::RING_DIP),
    (landmark::RING_DIP, landmark::RING_TIP),
    // 小指
    (landmark::WRIST, landmark::PINKY_MCP),
    (landmark::PINKY_MCP, landmark::PINKY_PIP),
    (landmark::PINKY_PIP, landmark::PINKY_DIP),
    (landmark::PINKY_DIP, landmark::PINKY_TIP),
    // 手のひら
    (landmark::INDEX_MCP, landmark::MIDDLE_MCP),
    (landmark::MIDDLE_MCP, landmark::RING_MCP),
    (landmark::RING_MCP, landmark::PINKY_MCP),
];

/// キー入力によるコマンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewCommand {
    /// 入力なし
    None,
    /// 終了（'q'またはESC）
    Quit,
    /// コントローラのリセット（'r'）
    Reset,
}

/// プレビューウィンドウ
pub struct PreviewWindow {
    title: String,
    initialized: bool,
}

impl PreviewWindow {
    const KEY_ESC: i32 = 27;
    const KEY_Q: i32 = 113;
    const KEY_R: i32 = 114;

    /// 新しいプレビューウィンドウを作成（表示は最初のrenderまで遅延）
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            initialized: false,
        }
    }

    /// フレームとオーバーレイを描画して表示
    pub fn render(
        &mut self,
        frame: &Frame,
        hands: &[HandLandmarks],
        gesture: Gesture,
        mode: ControlMode,
        pointer_active: bool,
    ) -> DomainResult<()> {
        if !self.initialized {
            highgui::named_window(&self.title, highgui::WINDOW_AUTOSIZE)
                .map_err(|e| DomainError::Other(format!("Failed to create window: {:?}", e)))?;
            self.initialized = true;
        }

        let mut canvas = frame_to_mat(frame)?;

        for hand in hands {
            draw_skeleton(&mut canvas, hand, frame.width, frame.height)?;
        }
        draw_hud(&mut canvas, hands, gesture, mode, pointer_active)?;

        highgui::imshow(&self.title, &canvas)
            .map_err(|e| DomainError::Other(format!("Failed to show preview: {:?}", e)))?;

        Ok(())
    }

    /// キー入力をポーリング（1msブロック）
    pub fn poll_key(&self) -> DomainResult<PreviewCommand> {
        let key = highgui::wait_key(1)
            .map_err(|e| DomainError::Other(format!("Failed to poll key: {:?}", e)))?;

        Ok(match key {
            Self::KEY_ESC | Self::KEY_Q => PreviewCommand::Quit,
            Self::KEY_R => PreviewCommand::Reset,
            _ => PreviewCommand::None,
        })
    }

    /// ウィンドウを破棄
    pub fn close(&mut self) {
        if self.initialized {
            let _ = highgui::destroy_all_windows();
            self.initialized = false;
        }
    }
}

impl Drop for PreviewWindow {
    fn drop(&mut self) {
        self.close();
    }
}

/// FrameのBGRバイト列を描画用のMatへ変換（コピー）
fn frame_to_mat(frame: &Frame) -> DomainResult<Mat> {
    let rows = frame.height as i32;

    // 1xNの平坦なMatとして借用し、rows x cols の3チャンネルに整形してから
    // 描画用に所有コピーを作る
    let flat = Mat::from_slice(&frame.data)
        .map_err(|e| DomainError::Other(format!("Failed to wrap frame data: {:?}", e)))?;
    let shaped = flat
        .reshape(Frame::CHANNELS as i32, rows)
        .map_err(|e| DomainError::Other(format!("Failed to reshape frame: {:?}", e)))?;
    shaped
        .try_clone()
        .map_err(|e| DomainError::Other(format!("Failed to copy frame: {:?}", e)))
}

/// 手のスケルトン（接続線 + 関節点）を描画
fn draw_skeleton(
    canvas: &mut Mat,
    hand: &HandLandmarks,
    width: u32,
    height: u32,
) -> DomainResult<()> {
    let to_px = |index: usize| {
        let p = hand.point(index);
        Point::new((p.x * width as f32) as i32, (p.y * height as f32) as i32)
    };

    let bone_color = Scalar::new(0.0, 200.0, 0.0, 0.0);
    let joint_color = Scalar::new(0.0, 0.0, 255.0, 0.0);

    for (a, b) in HAND_SKELETON {
        imgproc::line(canvas, to_px(a), to_px(b), bone_color, 2, LINE_8, 0)
            .map_err(|e| DomainError::Other(format!("Failed to draw bone: {:?}", e)))?;
    }

    for index in 0..landmark::COUNT {
        imgproc::circle(canvas, to_px(index), 3, joint_color, -1, LINE_8, 0)
            .map_err(|e| DomainError::Other(format!("Failed to draw joint: {:?}", e)))?;
    }

    Ok(())
}

/// ステータス表示と操作ガイドを描画
fn draw_hud(
    canvas: &mut Mat,
    hands: &[HandLandmarks],
    gesture: Gesture,
    mode: ControlMode,
    pointer_active: bool,
) -> DomainResult<()> {
    let green = Scalar::new(0.0, 255.0, 0.0, 0.0);
    let white = Scalar::new(255.0, 255.0, 255.0, 0.0);
    let yellow = Scalar::new(0.0, 255.0, 255.0, 0.0);
    let magenta = Scalar::new(255.0, 0.0, 255.0, 0.0);
    let gray = Scalar::new(200.0, 200.0, 200.0, 0.0);

    put_text(canvas, &format!("Gesture: {}", gesture.label()), 10, 30, 1.0, green, 2)?;
    put_text(
        canvas,
        &format!("Mode: {}", mode.as_str().to_uppercase()),
        10,
        70,
        0.7,
        white,
        2,
    )?;

    if pointer_active {
        put_text(canvas, "POINTER ACTIVE", 10, 110, 0.7, yellow, 2)?;
    }

    if let Some(hand) = hands.first() {
        put_text(
            canvas,
            &format!("Hand: {}", hand.handedness.as_str()),
            10,
            150,
            0.7,
            magenta,
            2,
        )?;
    }

    // 操作ガイド（画面下部）
    let instructions = [
        "Controls:",
        "POINT - Move cursor",
        "PINCH - Click",
        "FIST - Right click",
        "PEACE - Double click",
        "THUMBS UP - Scroll up",
        "OK - Scroll down",
        "Press 'q' to quit, 'r' to reset",
    ];

    let height = canvas.rows();
    let y_offset = height - 210;
    for (i, instruction) in instructions.iter().enumerate() {
        put_text(canvas, instruction, 10, y_offset + i as i32 * 25, 0.5, gray, 1)?;
    }

    Ok(())
}

fn put_text(
    canvas: &mut Mat,
    text: &str,
    x: i32,
    y: i32,
    scale: f64,
    color: Scalar,
    thickness: i32,
) -> DomainResult<()> {
    imgproc::put_text(
        canvas,
        text,
        Point::new(x, y),
        FONT_HERSHEY_SIMPLEX,
        scale,
        color,
        thickness,
        LINE_8,
        false,
    )
    .map_err(|e| DomainError::Other(format!("Failed to draw text: {:?}", e)))
}
