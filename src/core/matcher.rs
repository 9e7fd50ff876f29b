//! 匹配器 - 在候选视频开头搜索已学指纹的最佳对齐
//!
//! 对每个库内指纹 F 与每个起始偏移 o，计算逐位置平均距离，取全局最小。
//! 最小距离 <= 阈值（含等于）才接受；平局时先学的指纹赢，再取更小偏移。
//! 命中后剪切点 = 偏移 + 指纹时长，即从片头结束处开始保留。

use log::debug;

use crate::core::config::{MatchConfig, SnapPolicy};
use crate::core::fingerprint::FeatureVector;
use crate::core::store::SignatureStore;

/// 一次成功匹配的结果，调用方立即消费
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// 命中指纹的插入序号
    pub fingerprint_index: usize,
    /// 候选序列内的帧偏移
    pub offset_index: usize,
    pub offset_secs: f64,
    /// 剪切点（秒）= 偏移 + 指纹时长
    pub trim_secs: f64,
    /// 平均归一化距离
    pub distance: f64,
}

pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// 候选帧特征 vs 全库指纹，返回最佳匹配或 None（无片头）
    ///
    /// 候选短于最短指纹时直接返回 None，不做部分比较。
    pub fn find_match(
        &self,
        candidate: &[FeatureVector],
        store: &SignatureStore,
    ) -> Option<MatchResult> {
        let rate = store.sample_rate();
        let max_offset = (self.config.max_intro_secs * rate).round() as usize;

        let mut best: Option<(f64, usize, usize)> = None;
        for (index, fingerprint) in store.entries().iter().enumerate() {
            let n = fingerprint.len();
            if n == 0 || candidate.len() < n {
                continue;
            }
            let limit = (candidate.len() - n).min(max_offset);
            for offset in 0..=limit {
                let sum: f64 = fingerprint
                    .features
                    .iter()
                    .zip(&candidate[offset..offset + n])
                    .map(|(a, b)| a.distance(b))
                    .sum();
                let mean = sum / n as f64;
                // 严格小于：平局保持先学指纹、更小偏移
                if best.map_or(true, |(d, _, _)| mean < d) {
                    best = Some((mean, index, offset));
                }
            }
        }

        let (distance, index, offset) = best?;
        debug!(
            "best alignment: fingerprint {} offset {} distance {:.4}",
            index, offset, distance
        );
        if distance > self.config.threshold {
            return None;
        }

        let fingerprint = &store.entries()[index];
        let offset_secs = offset as f64 / rate;
        Some(MatchResult {
            fingerprint_index: index,
            offset_index: offset,
            offset_secs,
            trim_secs: offset_secs + fingerprint.duration_secs(),
            distance,
        })
    }

    /// 按配置的对齐策略修正剪切点
    ///
    /// `Keyframe` 吸附到最近的关键帧（stream-copy 安全边界），
    /// `Exact` 原样返回帧精确剪切点。
    pub fn plan_cut(&self, result: &MatchResult, keyframes: &[f64]) -> f64 {
        match self.config.snap {
            SnapPolicy::Exact => result.trim_secs,
            SnapPolicy::Keyframe => snap_to_keyframe(result.trim_secs, keyframes),
        }
    }
}

/// 最近关键帧；等距时取更早的那个，空列表原样返回
pub fn snap_to_keyframe(trim_secs: f64, keyframes: &[f64]) -> f64 {
    let mut best: Option<(f64, f64)> = None;
    for &kf in keyframes {
        let dist = (kf - trim_secs).abs();
        if best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, kf));
        }
    }
    best.map_or(trim_secs, |(_, kf)| kf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fingerprint::{FeatureVector, Fingerprint, MetricKind};
    use crate::core::store::SignatureStore;
    use chrono::Utc;

    fn hash_fingerprint(hashes: &[u64], rate: f64) -> Fingerprint {
        Fingerprint {
            features: hashes.iter().map(|&h| FeatureVector::Hash(h)).collect(),
            source_duration_secs: hashes.len() as f64 / rate,
            sample_rate: rate,
            created_at: Utc::now(),
        }
    }

    fn store_with(prints: &[&[u64]]) -> SignatureStore {
        let mut store = SignatureStore::new(MetricKind::Phash, 1.0);
        for p in prints {
            store.push(hash_fingerprint(p, 1.0)).unwrap();
        }
        store
    }

    fn hashes(values: &[u64]) -> Vec<FeatureVector> {
        values.iter().map(|&h| FeatureVector::Hash(h)).collect()
    }

    fn matcher(threshold: f64) -> Matcher {
        Matcher::new(MatchConfig {
            threshold,
            max_intro_secs: 300.0,
            snap: SnapPolicy::Exact,
        })
    }

    #[test]
    fn test_self_match_offset_zero() {
        let store = store_with(&[&[10, 20, 30, 40]]);
        let result = matcher(0.1)
            .find_match(&hashes(&[10, 20, 30, 40, 99, 98]), &store)
            .unwrap();

        assert_eq!(result.fingerprint_index, 0);
        assert_eq!(result.offset_index, 0);
        assert_eq!(result.distance, 0.0);
        assert_eq!(result.trim_secs, 4.0);
    }

    #[test]
    fn test_match_at_later_offset() {
        let store = store_with(&[&[10, 20]]);
        // 片头前有 2 帧其他内容
        let result = matcher(0.1)
            .find_match(&hashes(&[u64::MAX, u64::MAX, 10, 20, 5]), &store)
            .unwrap();

        assert_eq!(result.offset_index, 2);
        assert_eq!(result.offset_secs, 2.0);
        assert_eq!(result.trim_secs, 4.0);
    }

    #[test]
    fn test_no_match_above_threshold() {
        let store = store_with(&[&[0, 0]]);
        let result = matcher(0.1).find_match(&hashes(&[u64::MAX, u64::MAX]), &store);
        assert!(result.is_none());
    }

    #[test]
    fn test_threshold_boundary_inclusive() {
        // 单帧指纹，候选差 8 位 → 距离恰为 8/64 = 0.125
        let store = store_with(&[&[0]]);
        let candidate = hashes(&[0xFF]);

        // threshold == distance 接受
        assert!(matcher(0.125).find_match(&candidate, &store).is_some());
        // threshold - ε 拒绝
        assert!(matcher(0.125 - 1e-6).find_match(&candidate, &store).is_none());
        // threshold + ε 接受
        assert!(matcher(0.125 + 1e-6).find_match(&candidate, &store).is_some());
    }

    #[test]
    fn test_candidate_shorter_than_fingerprint() {
        let store = store_with(&[&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]]);
        // 3 帧候选对 10 帧指纹：NoMatch 而非崩溃
        assert!(matcher(1.0).find_match(&hashes(&[1, 2, 3]), &store).is_none());
        assert!(matcher(1.0).find_match(&[], &store).is_none());
    }

    #[test]
    fn test_tie_break_first_inserted_wins() {
        // 两个完全相同的指纹，距离必然相等
        let store = store_with(&[&[7, 7], &[7, 7]]);
        let result = matcher(0.5).find_match(&hashes(&[7, 7, 7]), &store).unwrap();

        assert_eq!(result.fingerprint_index, 0);
        // 偏移 0 与 1 同分，取更小者
        assert_eq!(result.offset_index, 0);
    }

    #[test]
    fn test_empty_store_never_matches() {
        let store = SignatureStore::new(MetricKind::Phash, 1.0);
        assert!(matcher(1.0).find_match(&hashes(&[1, 2]), &store).is_none());
    }

    #[test]
    fn test_max_intro_bounds_search() {
        let mut config = MatchConfig::default();
        config.threshold = 0.01;
        config.max_intro_secs = 2.0;
        let m = Matcher::new(config);

        let store = store_with(&[&[9]]);
        // 命中位置在搜索窗之外
        let candidate = hashes(&[0, u64::MAX, 0, u64::MAX, 9]);
        assert!(m.find_match(&candidate, &store).is_none());
    }

    #[test]
    fn test_snap_to_keyframe() {
        assert_eq!(snap_to_keyframe(10.4, &[0.0, 10.0, 12.0]), 10.0);
        assert_eq!(snap_to_keyframe(11.2, &[0.0, 10.0, 12.0]), 12.0);
        // 等距取更早
        assert_eq!(snap_to_keyframe(11.0, &[10.0, 12.0]), 10.0);
        // 无关键帧信息时原样返回
        assert_eq!(snap_to_keyframe(5.5, &[]), 5.5);
    }

    #[test]
    fn test_plan_cut_policies() {
        let result = MatchResult {
            fingerprint_index: 0,
            offset_index: 0,
            offset_secs: 0.0,
            trim_secs: 9.7,
            distance: 0.0,
        };

        let exact = matcher(0.5);
        assert_eq!(exact.plan_cut(&result, &[0.0, 10.0]), 9.7);

        let snapped = Matcher::new(MatchConfig {
            snap: SnapPolicy::Keyframe,
            ..MatchConfig::default()
        });
        assert_eq!(snapped.plan_cut(&result, &[0.0, 10.0]), 10.0);
    }
}
