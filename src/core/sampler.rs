//! 帧采样器 - 通过 ffmpeg 子进程按固定频率抽取帧
//!
//! 输出确定的帧序列：`fps` 滤镜按 `rate` 采样，`scale` 统一缩放到
//! 正方形 RGB24，原始像素流经 stdout 读入。子进程在返回前必然被回收，
//! 解码资源随调用作用域释放。

use std::path::Path;
use std::process::Command;

use log::debug;

use crate::core::config::SampleConfig;
use crate::core::error::{Result, VtrimError};
use crate::core::frame::Frame;
use crate::core::probe;

const FFMPEG: &str = "ffmpeg";

pub struct FrameSampler {
    frame_size: u32,
}

impl FrameSampler {
    pub fn new(config: &SampleConfig) -> Self {
        Self {
            frame_size: config.frame_size,
        }
    }

    /// 从 `start_secs` 起采样 `duration_secs` 长的窗口，每秒 `rate` 帧
    ///
    /// 视频短于请求窗口时返回 `InsufficientLength`（硬失败，不截断）。
    pub fn sample(
        &self,
        path: &Path,
        start_secs: f64,
        duration_secs: f64,
        rate: f64,
    ) -> Result<Vec<Frame>> {
        let total = probe::duration_secs(path)?;
        self.sample_with_duration(path, start_secs, duration_secs, rate, total)
    }

    /// 调用方已探测过容器时长时的入口，省掉一次 ffprobe
    pub fn sample_with_duration(
        &self,
        path: &Path,
        start_secs: f64,
        duration_secs: f64,
        rate: f64,
        total_secs: f64,
    ) -> Result<Vec<Frame>> {
        let needed = start_secs + duration_secs;
        if total_secs + 1e-6 < needed {
            return Err(VtrimError::InsufficientLength {
                needed_secs: needed,
                actual_secs: total_secs,
            });
        }

        let size = self.frame_size;
        let filter = format!("fps={rate},scale={size}:{size}");
        let output = Command::new(FFMPEG)
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-ss")
            .arg(start_secs.to_string())
            .arg("-t")
            .arg(duration_secs.to_string())
            .arg("-i")
            .arg(path)
            .arg("-vf")
            .arg(filter)
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("pipe:1")
            .output()
            .map_err(|e| VtrimError::SourceUnreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VtrimError::SourceUnreadable {
                path: path.display().to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        let frames = frames_from_raw(&output.stdout, size, rate);
        debug!(
            "{}: sampled {} frames ({}s @ {}fps)",
            path.display(),
            frames.len(),
            duration_secs,
            rate
        );

        // 解码流比请求窗口短也按硬失败处理
        let expected = (duration_secs * rate).floor().max(1.0) as usize;
        if frames.len() < expected {
            return Err(VtrimError::InsufficientLength {
                needed_secs: needed,
                actual_secs: start_secs + frames.len() as f64 / rate,
            });
        }

        Ok(frames)
    }
}

/// 把 rawvideo RGB24 字节流切成帧，时间戳按采样序号推算
fn frames_from_raw(raw: &[u8], size: u32, rate: f64) -> Vec<Frame> {
    let frame_bytes = (size * size * 3) as usize;
    raw.chunks_exact(frame_bytes)
        .enumerate()
        .map(|(i, chunk)| {
            let timestamp_ms = (i as f64 / rate * 1000.0) as u64;
            Frame::new(size, size, chunk.to_vec(), timestamp_ms)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_from_raw_chunks() {
        let size = 4u32;
        let frame_bytes = (size * size * 3) as usize;
        let raw = vec![7u8; frame_bytes * 3];

        let frames = frames_from_raw(&raw, size, 2.0);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].timestamp.as_millis(), 0);
        assert_eq!(frames[1].timestamp.as_millis(), 500);
        assert_eq!(frames[2].timestamp.as_millis(), 1000);
        assert!(frames.iter().all(|f| f.data.len() == frame_bytes));
    }

    #[test]
    fn test_sample_with_duration_rejects_short_window_before_decoding() {
        let sampler = FrameSampler::new(&SampleConfig::default());
        // 声明时长短于请求窗口：不存在的文件也应在起子进程前就失败
        let result = sampler.sample_with_duration(
            Path::new("does-not-exist.mkv"),
            0.0,
            10.0,
            1.0,
            3.0,
        );
        assert!(matches!(
            result,
            Err(VtrimError::InsufficientLength {
                needed_secs,
                actual_secs,
            }) if needed_secs == 10.0 && actual_secs == 3.0
        ));
    }

    #[test]
    fn test_frames_from_raw_drops_partial_tail() {
        let size = 4u32;
        let frame_bytes = (size * size * 3) as usize;
        let raw = vec![0u8; frame_bytes + frame_bytes / 2];

        let frames = frames_from_raw(&raw, size, 1.0);
        assert_eq!(frames.len(), 1);
    }
}
