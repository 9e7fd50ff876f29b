//! learn 操作 - 从样本视频学习片头指纹并入库

use std::path::PathBuf;

use log::{info, warn};

use crate::core::config::SampleConfig;
use crate::core::error::Result;
use crate::core::fingerprint::{Fingerprinter, MetricKind};
use crate::core::sampler::FrameSampler;
use crate::core::store::SignatureStore;

#[derive(Debug, Clone)]
pub struct LearnRequest {
    pub source: PathBuf,
    pub store_path: PathBuf,
    pub start_secs: f64,
    pub duration_secs: f64,
    /// 新建库时使用的度量族；已有库沿用库内配置
    pub metric: MetricKind,
}

/// 采样 → 指纹 → 入库 → 原子落盘，返回库内条目总数
pub fn learn(request: &LearnRequest, sample: &SampleConfig) -> Result<usize> {
    let mut store = if request.store_path.exists() {
        let store = SignatureStore::load(&request.store_path)?;
        if store.metric() != request.metric {
            warn!(
                "store already uses {:?}, ignoring requested metric {:?}",
                store.metric(),
                request.metric
            );
        }
        store
    } else {
        SignatureStore::new(request.metric, sample.rate)
    };

    info!(
        "learning {}s window from {} (start {}s)",
        request.duration_secs,
        request.source.display(),
        request.start_secs
    );

    let sampler = FrameSampler::new(sample);
    let frames = sampler.sample(
        &request.source,
        request.start_secs,
        request.duration_secs,
        store.sample_rate(),
    )?;

    let fingerprinter = Fingerprinter::new(store.metric(), store.sample_rate());
    let fingerprint = fingerprinter.fingerprint(&frames);
    info!(
        "fingerprint: {} features, {:.1}s",
        fingerprint.len(),
        fingerprint.duration_secs()
    );

    store.push(fingerprint)?;
    store.persist(&request.store_path)?;
    Ok(store.len())
}
