//! 剪切执行器 - 调用 ffmpeg 产出去掉片头的文件
//!
//! 关键帧对齐的剪切点走 stream-copy（不重编码，快），
//! 帧精确剪切点落在非关键帧边界时回退到重编码。

use std::path::Path;
use std::process::Command;

use log::{debug, info};

use crate::core::error::{Result, VtrimError};

const FFMPEG: &str = "ffmpeg";

/// 剪切点离关键帧多近算对齐（秒）
pub const KEYFRAME_EPSILON: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimMode {
    /// 复制码流，仅关键帧边界安全
    StreamCopy,
    /// 视频重编码，音频复制
    Reencode,
}

/// 根据剪切点与关键帧的对齐情况选择执行方式
pub fn choose_mode(trim_secs: f64, keyframes: &[f64]) -> TrimMode {
    let aligned = keyframes
        .iter()
        .any(|&kf| (kf - trim_secs).abs() <= KEYFRAME_EPSILON);
    if aligned {
        TrimMode::StreamCopy
    } else {
        TrimMode::Reencode
    }
}

/// 把 `src` 从 `trim_secs` 起写入 `dest`
pub fn trim(src: &Path, dest: &Path, trim_secs: f64, mode: TrimMode) -> Result<()> {
    info!(
        "cut {} at {:.3}s ({:?}) -> {}",
        src.display(),
        trim_secs,
        mode,
        dest.display()
    );

    let mut cmd = Command::new(FFMPEG);
    cmd.arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-ss")
        .arg(trim_secs.to_string())
        .arg("-i")
        .arg(src);

    match mode {
        TrimMode::StreamCopy => {
            cmd.arg("-c:v")
                .arg("copy")
                .arg("-c:a")
                .arg("copy")
                .arg("-avoid_negative_ts")
                .arg("make_zero");
        }
        TrimMode::Reencode => {
            cmd.arg("-c:v")
                .arg("libx264")
                .arg("-preset")
                .arg("veryfast")
                .arg("-crf")
                .arg("18")
                .arg("-c:a")
                .arg("copy");
        }
    }

    let output = cmd.arg("-y").arg(dest).output()?;
    debug!("ffmpeg status: {}", output.status);

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VtrimError::Ffmpeg {
            status: output.status.code().unwrap_or(-1),
            stderr: stderr.trim().to_string(),
        });
    }
    Ok(())
}
