//! 指纹计算 - 把帧序列约简为可比较的紧凑签名
//!
//! 两种度量族，创建指纹时固定：
//! - pHash：32x32 灰度 → 2D DCT-II → 低频 8x8 → 64 位哈希，汉明距离
//! - 直方图：64 bin 灰度直方图，归一化 L1 距离
//!
//! 变换必须纯且确定：相同帧永远得到相同特征向量。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rustdct::{DctPlanner, TransformType2And3};
use serde::{Deserialize, Serialize};

use crate::core::frame::Frame;

/// pHash 位数
pub const HASH_BITS: usize = 64;
/// DCT 输入边长
const DCT_SIZE: usize = 32;
/// 直方图 bin 数
pub const HIST_BINS: usize = 64;

/// 距离度量族标识（随 store 持久化）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Phash,
    Histogram,
}

/// 单帧特征向量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureVector {
    Hash(u64),
    Histogram(Vec<u32>),
}

impl FeatureVector {
    pub fn dimension(&self) -> usize {
        match self {
            FeatureVector::Hash(_) => HASH_BITS,
            FeatureVector::Histogram(bins) => bins.len(),
        }
    }

    pub fn metric(&self) -> MetricKind {
        match self {
            FeatureVector::Hash(_) => MetricKind::Phash,
            FeatureVector::Histogram(_) => MetricKind::Histogram,
        }
    }

    /// 归一化距离 [0, 1]，0 为完全一致
    pub fn distance(&self, other: &FeatureVector) -> f64 {
        match (self, other) {
            (FeatureVector::Hash(a), FeatureVector::Hash(b)) => {
                (a ^ b).count_ones() as f64 / HASH_BITS as f64
            }
            (FeatureVector::Histogram(a), FeatureVector::Histogram(b)) => {
                let diff: u64 = a
                    .iter()
                    .zip(b.iter())
                    .map(|(&x, &y)| (x as i64 - y as i64).unsigned_abs())
                    .sum();
                let total: u64 = a.iter().map(|&x| x as u64).sum::<u64>()
                    + b.iter().map(|&y| y as u64).sum::<u64>();
                if total == 0 {
                    return 0.0;
                }
                diff as f64 / total as f64
            }
            // store 不变式保证不会跨度量族比较
            _ => 1.0,
        }
    }
}

/// 学到的片头指纹：有序特征序列 + 元数据，入库后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub features: Vec<FeatureVector>,
    pub source_duration_secs: f64,
    pub sample_rate: f64,
    pub created_at: DateTime<Utc>,
}

impl Fingerprint {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// 指纹覆盖的时长（秒）
    pub fn duration_secs(&self) -> f64 {
        self.features.len() as f64 / self.sample_rate
    }

    pub fn dimension(&self) -> Option<usize> {
        self.features.first().map(|f| f.dimension())
    }
}

/// 指纹计算器
pub struct Fingerprinter {
    metric: MetricKind,
    sample_rate: f64,
    dct: Arc<dyn TransformType2And3<f32>>,
}

impl Fingerprinter {
    pub fn new(metric: MetricKind, sample_rate: f64) -> Self {
        let mut planner = DctPlanner::new();
        let dct = planner.plan_dct2(DCT_SIZE);
        Self {
            metric,
            sample_rate,
            dct,
        }
    }

    /// 帧序列 → 指纹（逐帧独立约简，无跨帧状态）
    pub fn fingerprint(&self, frames: &[Frame]) -> Fingerprint {
        Fingerprint {
            features: self.features(frames),
            source_duration_secs: frames.len() as f64 / self.sample_rate,
            sample_rate: self.sample_rate,
            created_at: Utc::now(),
        }
    }

    pub fn features(&self, frames: &[Frame]) -> Vec<FeatureVector> {
        frames.iter().map(|f| self.feature(f)).collect()
    }

    /// 单帧 → 特征向量
    pub fn feature(&self, frame: &Frame) -> FeatureVector {
        match self.metric {
            MetricKind::Phash => FeatureVector::Hash(self.phash(frame)),
            MetricKind::Histogram => FeatureVector::Histogram(Self::histogram(frame)),
        }
    }

    /// DCT 感知哈希：低频 8x8 系数与均值（不含 DC）比较
    fn phash(&self, frame: &Frame) -> u64 {
        let gray = frame.resize_to(DCT_SIZE as u32, DCT_SIZE as u32).to_gray();

        let mut matrix: Vec<f32> = gray.iter().map(|&v| v as f32).collect();

        // 行变换
        for row in matrix.chunks_exact_mut(DCT_SIZE) {
            self.dct.process_dct2(row);
        }

        // 列变换
        let mut column = [0.0f32; DCT_SIZE];
        for x in 0..DCT_SIZE {
            for y in 0..DCT_SIZE {
                column[y] = matrix[y * DCT_SIZE + x];
            }
            self.dct.process_dct2(&mut column);
            for y in 0..DCT_SIZE {
                matrix[y * DCT_SIZE + x] = column[y];
            }
        }

        // 取左上 8x8 低频块
        let mut coeffs = [0.0f32; HASH_BITS];
        for y in 0..8 {
            for x in 0..8 {
                coeffs[y * 8 + x] = matrix[y * DCT_SIZE + x];
            }
        }

        // 均值不含 DC 分量
        let mean = (coeffs.iter().sum::<f32>() - coeffs[0]) / (HASH_BITS - 1) as f32;

        let mut hash: u64 = 0;
        for (i, &val) in coeffs.iter().enumerate() {
            if val > mean {
                hash |= 1 << i;
            }
        }
        hash
    }

    /// 64 bin 灰度直方图
    fn histogram(frame: &Frame) -> Vec<u32> {
        let mut hist = vec![0u32; HIST_BINS];
        for val in frame.to_gray() {
            hist[(val >> 2) as usize] += 1;
        }
        hist
    }
}
