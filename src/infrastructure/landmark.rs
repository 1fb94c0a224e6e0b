/// MediaPipeランドマーク検出アダプタ
///
/// 学習済みのMediaPipe Hand Landmarkerモデルを、同梱のPythonヘルパー
/// （scripts/hand_landmarker.py）経由で呼び出す。検出そのものは外部モデルに
/// 完全に委譲し、このアダプタはフレームの受け渡しと結果の解析だけを行う。
///
/// # プロトコル
/// - 起動時: ヘルパーが標準出力に `READY` を1行出力
/// - フレーム毎: 12バイトのリトルエンディアンヘッダ（width, height, channels）
///   + 生のBGRバイト列を標準入力へ書き込み、JSONを1行読み取る
/// - 応答: `{"hands":[{"handedness":…,"score":…,"landmarks":[{x,y,z}×21]}]}`

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use serde::Deserialize;

use crate::domain::config::TrackerConfig;
use crate::domain::types::landmark;
use crate::domain::{
    DomainError, DomainResult, Frame, HandLandmarks, Handedness, Landmark, TrackerPort,
};

/// フレームヘッダをエンコード（width, height, channels をLE u32で連結）
pub fn frame_header(width: u32, height: u32, channels: u32) -> [u8; 12] {
    let mut header = [0u8; 12];
    header[0..4].copy_from_slice(&width.to_le_bytes());
    header[4..8].copy_from_slice(&height.to_le_bytes());
    header[8..12].copy_from_slice(&channels.to_le_bytes());
    header
}

/// ヘルパーのJSON応答（1行 = 1フレーム分）
#[derive(Debug, Deserialize)]
struct DetectionJson {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HandJson {
    handedness: String,
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Debug, Deserialize)]
struct LandmarkJson {
    x: f32,
    y: f32,
    z: f32,
}

/// JSON応答をドメイン型へ変換
///
/// 信頼度が閾値未満の手、ランドマーク数が21以外の手は破棄する。
fn parse_response(line: &str, min_confidence: f32) -> DomainResult<Vec<HandLandmarks>> {
    let response: DetectionJson = serde_json::from_str(line)
        .map_err(|e| DomainError::Tracker(format!("Failed to parse response '{}': {}", line.trim(), e)))?;

    if let Some(error) = response.error {
        tracing::warn!("Landmark helper reported: {}", error);
        return Ok(Vec::new());
    }

    let mut hands = Vec::new();
    for hand in response.hands {
        if hand.score < min_confidence {
            tracing::debug!(
                "Discarding hand below confidence threshold: {:.2} < {:.2}",
                hand.score,
                min_confidence
            );
            continue;
        }
        if hand.landmarks.len() != landmark::COUNT {
            tracing::warn!(
                "Expected {} landmarks, got {}",
                landmark::COUNT,
                hand.landmarks.len()
            );
            continue;
        }

        let mut points = [Landmark::default(); landmark::COUNT];
        for (i, lm) in hand.landmarks.iter().enumerate() {
            points[i] = Landmark::new(lm.x, lm.y, lm.z);
        }

        hands.push(HandLandmarks::new(
            points,
            Handedness::from_label(&hand.handedness),
            hand.score,
        ));
    }

    Ok(hands)
}

/// MediaPipeトラッカーアダプタ
pub struct MediaPipeTrackerAdapter {
    process: Child,
    stdout_reader: BufReader<ChildStdout>,
    min_detection_confidence: f32,
}

impl MediaPipeTrackerAdapter {
    /// Pythonヘルパーを起動してアダプタを作成
    ///
    /// READYのハンドシェイクまでブロックする。
    pub fn new(config: &TrackerConfig) -> DomainResult<Self> {
        let script = Path::new(&config.script);
        if !script.exists() {
            return Err(DomainError::Initialization(format!(
                "Landmark helper script not found at {:?}. \
                 Install the Python side with: pip install mediapipe numpy",
                script
            )));
        }

        tracing::info!("Starting MediaPipe landmark helper: {} {}", config.python, config.script);

        let mut process = Command::new(&config.python)
            .arg(script)
            .arg("--max-hands")
            .arg(config.max_num_hands.to_string())
            .arg("--min-detection-confidence")
            .arg(config.min_detection_confidence.to_string())
            .arg("--min-tracking-confidence")
            .arg(config.min_tracking_confidence.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                DomainError::Initialization(format!("Failed to start landmark helper: {}", e))
            })?;

        let stdout = process.stdout.take().ok_or_else(|| {
            DomainError::Initialization("Failed to attach to helper stdout".to_string())
        })?;
        let mut stdout_reader = BufReader::new(stdout);

        // READYハンドシェイク（モデルのロード完了待ち）
        let mut ready_line = String::new();
        stdout_reader.read_line(&mut ready_line).map_err(|e| {
            DomainError::Initialization(format!("Failed to read helper handshake: {}", e))
        })?;
        if ready_line.trim() != "READY" {
            let _ = process.kill();
            return Err(DomainError::Initialization(format!(
                "Landmark helper did not signal READY, got: {:?}",
                ready_line.trim()
            )));
        }

        tracing::info!("MediaPipe landmark helper ready");

        Ok(Self {
            process,
            stdout_reader,
            min_detection_confidence: config.min_detection_confidence,
        })
    }
}

impl TrackerPort for MediaPipeTrackerAdapter {
    fn detect_hands(&mut self, frame: &Frame) -> DomainResult<Vec<HandLandmarks>> {
        let stdin = self.process.stdin.as_mut().ok_or_else(|| {
            DomainError::Tracker("Helper stdin is not available".to_string())
        })?;

        crate::measure_span!("detect_hands", {
            // ヘッダ + 生BGRバイト列を書き込み
            let header = frame_header(frame.width, frame.height, Frame::CHANNELS);
            stdin
                .write_all(&header)
                .and_then(|_| stdin.write_all(&frame.data))
                .and_then(|_| stdin.flush())
                .map_err(|e| DomainError::Tracker(format!("Failed to send frame: {}", e)))?;

            // JSON応答を1行読み取り
            let mut response = String::new();
            let n = self
                .stdout_reader
                .read_line(&mut response)
                .map_err(|e| DomainError::Tracker(format!("Failed to read response: {}", e)))?;
            if n == 0 {
                return Err(DomainError::Tracker(
                    "Landmark helper exited unexpectedly".to_string(),
                ));
            }

            parse_response(&response, self.min_detection_confidence)
        })
    }

    fn backend_name(&self) -> &'static str {
        "mediapipe"
    }
}

impl Drop for MediaPipeTrackerAdapter {
    fn drop(&mut self) {
        // ヘルパープロセスを道連れにする
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}
