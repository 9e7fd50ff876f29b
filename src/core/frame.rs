use std::time::Duration;

/// 解码后的帧数据（RGB24 格式）
///
/// 仅在采样期间存在，不落盘。
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGB24 格式
    pub timestamp: Duration,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>, timestamp_ms: u64) -> Self {
        Self {
            width,
            height,
            data,
            timestamp: Duration::from_millis(timestamp_ms),
        }
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// 转灰度（BT.601 加权）
    pub fn to_gray(&self) -> Vec<u8> {
        self.data
            .chunks_exact(3)
            .map(|rgb| {
                ((rgb[0] as u32 * 299 + rgb[1] as u32 * 587 + rgb[2] as u32 * 114) / 1000) as u8
            })
            .collect()
    }

    pub fn resize_to(&self, target_width: u32, target_height: u32) -> Frame {
        let img = image::RgbImage::from_raw(self.width, self.height, self.data.clone())
            .expect("Invalid frame data");
        let resized = image::imageops::resize(
            &img,
            target_width,
            target_height,
            image::imageops::FilterType::Triangle,
        );

        Frame {
            width: target_width,
            height: target_height,
            data: resized.into_raw(),
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let data = vec![255u8; 100 * 100 * 3]; // 100x100 white image
        let frame = Frame::new(100, 100, data, 1000);

        assert_eq!(frame.width, 100);
        assert_eq!(frame.height, 100);
        assert_eq!(frame.pixel_count(), 10000);
        assert_eq!(frame.timestamp.as_millis(), 1000);
    }

    #[test]
    fn test_frame_resize() {
        let data = vec![255u8; 100 * 100 * 3];
        let frame = Frame::new(100, 100, data, 0);
        let resized = frame.resize_to(32, 32);

        assert_eq!(resized.width, 32);
        assert_eq!(resized.height, 32);
        assert_eq!(resized.data.len(), 32 * 32 * 3);
    }

    #[test]
    fn test_to_gray() {
        let mut data = vec![0u8; 2 * 1 * 3];
        data[0] = 255; // 白色像素
        data[1] = 255;
        data[2] = 255;
        let frame = Frame::new(2, 1, data, 0);
        let gray = frame.to_gray();

        assert_eq!(gray.len(), 2);
        assert_eq!(gray[0], 255);
        assert_eq!(gray[1], 0);
    }
}
