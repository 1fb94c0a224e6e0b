/// カメラキャプチャアダプタ
///
/// OpenCV VideoCaptureを使用したWebカメラ取り込みの実装。
/// ミラー（鏡像）反転もここで適用する。

use crate::domain::{CapturePort, DeviceInfo, DomainError, DomainResult, Frame};
use crate::domain::config::CameraConfig;
use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio,
};

/// OpenCVカメラアダプタ
pub struct OpenCvCameraAdapter {
    cap: videoio::VideoCapture,
    index: i32,
    width: u32,
    height: u32,
    fps: u32,
    mirror: bool,
}

impl OpenCvCameraAdapter {
    /// カメラをオープンしてアダプタを作成
    ///
    /// # Arguments
    /// - `config`: カメラ設定（デバイス番号・解像度・fps・ミラー）
    ///
    /// # Returns
    /// - `Ok(adapter)`: オープン成功
    /// - `Err(DomainError::Initialization)`: カメラが開けない
    pub fn new(config: &CameraConfig) -> DomainResult<Self> {
        let cap = Self::open_device(config.index, config.width, config.height, config.fps)?;

        let mut adapter = Self {
            cap,
            index: config.index,
            width: config.width,
            height: config.height,
            fps: config.fps,
            mirror: config.mirror,
        };

        // 実際に適用された値を保持（デバイスが要求を丸めることがある）
        adapter.width = adapter.prop_or(videoio::CAP_PROP_FRAME_WIDTH, config.width);
        adapter.height = adapter.prop_or(videoio::CAP_PROP_FRAME_HEIGHT, config.height);
        adapter.fps = adapter.prop_or(videoio::CAP_PROP_FPS, config.fps);

        Ok(adapter)
    }

    /// デバイスをオープンしてプロパティを設定
    fn open_device(index: i32, width: u32, height: u32, fps: u32) -> DomainResult<videoio::VideoCapture> {
        let mut cap = videoio::VideoCapture::new(index, videoio::CAP_ANY)
            .map_err(|e| DomainError::Initialization(format!("Failed to create capture: {:?}", e)))?;

        let opened = cap
            .is_opened()
            .map_err(|e| DomainError::Initialization(format!("Failed to query capture: {:?}", e)))?;
        if !opened {
            return Err(DomainError::Initialization(format!(
                "Could not open camera {}",
                index
            )));
        }

        // 要求値の設定（デバイスが対応しない場合は無視される）
        let _ = cap.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64);
        let _ = cap.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64);
        let _ = cap.set(videoio::CAP_PROP_FPS, fps as f64);

        Ok(cap)
    }

    /// プロパティを取得（取得できない場合はフォールバック値）
    fn prop_or(&self, prop: i32, fallback: u32) -> u32 {
        match self.cap.get(prop) {
            Ok(value) if value > 0.0 => value as u32,
            _ => fallback,
        }
    }

    /// MatをBGRバイト列のFrameへ変換
    fn mat_to_frame(&self, mat: &Mat) -> DomainResult<Frame> {
        let data = mat
            .data_bytes()
            .map_err(|e| DomainError::Capture(format!("Failed to read frame data: {:?}", e)))?
            .to_vec();

        let frame = Frame::new(data, mat.cols() as u32, mat.rows() as u32);
        if !frame.is_well_formed() {
            return Err(DomainError::Capture(format!(
                "Unexpected frame layout: {} bytes for {}x{}",
                frame.data.len(),
                frame.width,
                frame.height
            )));
        }
        Ok(frame)
    }
}

impl CapturePort for OpenCvCameraAdapter {
    fn capture_frame(&mut self) -> DomainResult<Option<Frame>> {
        let mut mat = Mat::default();
        let ok = crate::measure_span!("capture_frame", {
            self.cap
                .read(&mut mat)
                .map_err(|e| DomainError::Capture(format!("Failed to read frame: {:?}", e)))?
        });

        if !ok || mat.empty() {
            return Ok(None);
        }

        let frame = if self.mirror {
            let mut flipped = Mat::default();
            core::flip(&mat, &mut flipped, 1)
                .map_err(|e| DomainError::Capture(format!("Failed to flip frame: {:?}", e)))?;
            self.mat_to_frame(&flipped)?
        } else {
            self.mat_to_frame(&mat)?
        };

        Ok(Some(frame))
    }

    fn reinitialize(&mut self) -> DomainResult<()> {
        tracing::info!("Reopening camera {}", self.index);
        self.cap = Self::open_device(self.index, self.width, self.height, self.fps)?;
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            width: self.width,
            height: self.height,
            fps: self.fps,
            name: format!("camera{}", self.index),
        }
    }
}
