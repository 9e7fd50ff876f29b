//! ffprobe 封装 - 时长与关键帧探测

use std::path::Path;
use std::process::Command;

use log::debug;

use crate::core::error::{Result, VtrimError};

const FFPROBE: &str = "ffprobe";

fn unreadable(path: &Path, reason: impl Into<String>) -> VtrimError {
    VtrimError::SourceUnreadable {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// 容器时长（秒）
pub fn duration_secs(path: &Path) -> Result<f64> {
    let output = Command::new(FFPROBE)
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(path)
        .output()
        .map_err(|e| unreadable(path, e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(unreadable(path, stderr.trim().to_string()));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    parse_duration(&text).ok_or_else(|| unreadable(path, "no duration in probe output"))
}

/// 视频流关键帧时间戳（秒，升序）
pub fn keyframes(path: &Path) -> Result<Vec<f64>> {
    let output = Command::new(FFPROBE)
        .arg("-loglevel")
        .arg("error")
        .arg("-select_streams")
        .arg("v:0")
        .arg("-show_entries")
        .arg("packet=pts_time,flags")
        .arg("-of")
        .arg("csv=print_section=0")
        .arg(path)
        .output()
        .map_err(|e| unreadable(path, e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(unreadable(path, stderr.trim().to_string()));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let frames = parse_keyframes(&text);
    debug!("{}: {} keyframes", path.display(), frames.len());
    Ok(frames)
}

fn parse_duration(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0)
}

/// 解析 `pts_time,flags` CSV，保留带 K 标志的包
fn parse_keyframes(text: &str) -> Vec<f64> {
    let mut result = Vec::new();
    for line in text.lines() {
        let mut parts = line.trim().split(',');
        let (Some(pts), Some(flags)) = (parts.next(), parts.next()) else {
            continue;
        };
        if !flags.contains('K') {
            continue;
        }
        if let Ok(t) = pts.parse::<f64>() {
            result.push(t);
        }
    }
    result.sort_by(f64::total_cmp);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("123.456\n"), Some(123.456));
        assert_eq!(parse_duration("garbage"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_parse_keyframes() {
        let csv = "0.000000,K__\n0.040000,___\n2.000000,K__\n4.000000,K__\n";
        assert_eq!(parse_keyframes(csv), vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_parse_keyframes_skips_malformed() {
        let csv = "notanumber,K__\n1.5,K__\n\n";
        assert_eq!(parse_keyframes(csv), vec![1.5]);
    }
}
