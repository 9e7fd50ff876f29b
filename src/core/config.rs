//! 显式配置结构 - 替代源工具里的隐式全局默认值

/// 采样参数
#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// 每秒采样帧数
    pub rate: f64,
    /// 解码后统一缩放到的边长（正方形，忽略宽高比）
    pub frame_size: u32,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            frame_size: 128,
        }
    }
}

/// 匹配时的剪切点对齐策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapPolicy {
    /// 帧精确剪切点（非关键帧边界时需要重编码）
    Exact,
    /// 吸附到最近的关键帧（仅 stream-copy 模式）
    Keyframe,
}

/// 匹配参数
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// 接受阈值：平均归一化距离 <= threshold 视为命中（含等于）
    pub threshold: f64,
    /// 搜索窗口上限（秒），候选起始偏移不超过该值
    pub max_intro_secs: f64,
    pub snap: SnapPolicy,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.12,
            max_intro_secs: 300.0,
            snap: SnapPolicy::Keyframe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let sample = SampleConfig::default();
        assert_eq!(sample.rate, 1.0);
        assert_eq!(sample.frame_size, 128);

        let matching = MatchConfig::default();
        assert!(matching.threshold > 0.0 && matching.threshold < 1.0);
        assert_eq!(matching.snap, SnapPolicy::Keyframe);
    }
}
