//! 签名库 - 指纹的持久化存储
//!
//! 单文件 JSON，整体载入内存，原子重写（临时文件 + rename），
//! 崩溃不会破坏已学到的指纹。所有条目共享同一特征维度与采样约定，
//! 载入不一致的库是硬错误而非静默跳过。

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, VtrimError};
use crate::core::fingerprint::{Fingerprint, MetricKind};

/// 当前库文件格式版本
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureStore {
    version: u32,
    /// 特征维度（0 = 尚无条目，首次入库时确定）
    dimension: usize,
    sample_rate: f64,
    metric: MetricKind,
    entries: Vec<Fingerprint>,
}

impl SignatureStore {
    pub fn new(metric: MetricKind, sample_rate: f64) -> Self {
        Self {
            version: FORMAT_VERSION,
            dimension: 0,
            sample_rate,
            metric,
            entries: Vec::new(),
        }
    }

    pub fn metric(&self) -> MetricKind {
        self.metric
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 所有条目，保持插入顺序（匹配平局时先学先赢依赖该顺序）
    pub fn entries(&self) -> &[Fingerprint] {
        &self.entries
    }

    /// 追加新指纹，校验维度与采样约定
    pub fn push(&mut self, fingerprint: Fingerprint) -> Result<()> {
        let dim = fingerprint.dimension().unwrap_or(0);
        if dim == 0 {
            return Err(VtrimError::DimensionMismatch {
                expected: self.dimension,
                actual: 0,
            });
        }
        if self.dimension != 0 && dim != self.dimension {
            return Err(VtrimError::DimensionMismatch {
                expected: self.dimension,
                actual: dim,
            });
        }
        if fingerprint
            .features
            .iter()
            .any(|f| f.metric() != self.metric || f.dimension() != dim)
        {
            return Err(VtrimError::DimensionMismatch {
                expected: dim,
                actual: 0,
            });
        }
        if fingerprint.sample_rate != self.sample_rate {
            return Err(VtrimError::SampleRateMismatch {
                expected: self.sample_rate,
                actual: fingerprint.sample_rate,
            });
        }

        self.dimension = dim;
        self.entries.push(fingerprint);
        Ok(())
    }

    /// 载入库文件
    ///
    /// 版本不符 → `UnsupportedVersion`；无法解析 → `CorruptStore`；
    /// 条目维度不一致 → `DimensionMismatch`。
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| VtrimError::CorruptStore(format!("{}: {e}", path.display())))?;

        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| VtrimError::CorruptStore(format!("{}: {e}", path.display())))?;

        let version = value
            .get("version")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| VtrimError::CorruptStore("missing version field".into()))?
            as u32;
        if version != FORMAT_VERSION {
            return Err(VtrimError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            });
        }

        let store: SignatureStore = serde_json::from_value(value)
            .map_err(|e| VtrimError::CorruptStore(format!("{}: {e}", path.display())))?;
        store.validate()?;
        info!("loaded {} fingerprints from {}", store.len(), path.display());
        Ok(store)
    }

    /// 原子写盘：写临时文件再 rename，失败不影响旧文件
    pub fn persist(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| VtrimError::CorruptStore(e.to_string()))?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = Path::new(&tmp);

        fs::write(tmp, text)?;
        fs::rename(tmp, path)?;
        info!("wrote {} fingerprints to {}", self.len(), path.display());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for entry in &self.entries {
            let dim = entry.dimension().unwrap_or(0);
            if dim != self.dimension
                || entry
                    .features
                    .iter()
                    .any(|f| f.metric() != self.metric || f.dimension() != dim)
            {
                return Err(VtrimError::DimensionMismatch {
                    expected: self.dimension,
                    actual: dim,
                });
            }
        }
        Ok(())
    }
}
