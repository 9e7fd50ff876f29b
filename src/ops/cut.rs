//! cut 操作 - 批量检测并剪掉片头
//!
//! 单文件失败只记入报告，批次继续；库文件无效则整体中止。
//! `NoMatch` 不是错误：按配置复制或跳过该文件。

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;

use crate::core::config::{MatchConfig, SampleConfig, SnapPolicy};
use crate::core::error::Result;
use crate::core::fingerprint::Fingerprinter;
use crate::core::matcher::Matcher;
use crate::core::probe;
use crate::core::sampler::FrameSampler;
use crate::core::store::SignatureStore;
use crate::core::trimmer::{self, TrimMode};

/// 未命中片头时对文件的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMatchAction {
    /// 原样复制到输出目录
    Copy,
    /// 不产出任何文件
    Skip,
}

#[derive(Debug, Clone)]
pub struct CutRequest {
    /// 文件或目录（目录递归遍历）
    pub inputs: Vec<PathBuf>,
    pub store_path: PathBuf,
    pub out_dir: PathBuf,
    /// 扩展名白名单（小写，不带点），None = 不过滤
    pub extensions: Option<Vec<String>>,
    pub on_no_match: NoMatchAction,
    /// 剪完后把输出移回源路径（覆盖原文件）
    pub move_back: bool,
    /// 多文件并行处理（库只读共享）
    pub parallel: bool,
}

/// 批次结果汇总
#[derive(Debug, Default)]
pub struct CutReport {
    pub trimmed: usize,
    pub unmatched: usize,
    pub failed: Vec<(PathBuf, String)>,
}

impl CutReport {
    pub fn total(&self) -> usize {
        self.trimmed + self.unmatched + self.failed.len()
    }

    /// 全部文件都命中并剪切成功才算完全成功
    pub fn is_full_success(&self) -> bool {
        self.unmatched == 0 && self.failed.is_empty()
    }
}

enum FileOutcome {
    Trimmed,
    NoIntro,
    Failed(String),
}

pub fn cut(request: &CutRequest, sample: &SampleConfig, matching: &MatchConfig) -> Result<CutReport> {
    // 库级错误直接中止，无库无从匹配
    let store = SignatureStore::load(&request.store_path)?;
    if store.is_empty() {
        warn!("store {} has no fingerprints", request.store_path.display());
    }

    fs::create_dir_all(&request.out_dir)?;

    let files = collect_inputs(&request.inputs, request.extensions.as_deref())?;
    info!("{} candidate files", files.len());

    let longest = store
        .entries()
        .iter()
        .map(|f| f.duration_secs())
        .fold(0.0f64, f64::max);
    let shortest = store
        .entries()
        .iter()
        .map(|f| f.duration_secs())
        .fold(f64::INFINITY, f64::min);

    let process = |file: &PathBuf| -> FileOutcome {
        match process_file(file, request, sample, matching, &store, longest, shortest) {
            Ok(outcome) => outcome,
            Err(e) => FileOutcome::Failed(e.to_string()),
        }
    };

    let outcomes: Vec<(PathBuf, FileOutcome)> = if request.parallel {
        files
            .par_iter()
            .map(|f| (f.clone(), process(f)))
            .collect()
    } else {
        files.iter().map(|f| (f.clone(), process(f))).collect()
    };

    let mut report = CutReport::default();
    for (file, outcome) in outcomes {
        match outcome {
            FileOutcome::Trimmed => report.trimmed += 1,
            FileOutcome::NoIntro => report.unmatched += 1,
            FileOutcome::Failed(reason) => {
                warn!("{}: {}", file.display(), reason);
                report.failed.push((file, reason));
            }
        }
    }
    info!(
        "total: {} trimmed: {} no-intro: {} failed: {}",
        report.total(),
        report.trimmed,
        report.unmatched,
        report.failed.len()
    );
    Ok(report)
}

fn process_file(
    file: &Path,
    request: &CutRequest,
    sample: &SampleConfig,
    matching: &MatchConfig,
    store: &SignatureStore,
    longest_secs: f64,
    shortest_secs: f64,
) -> Result<FileOutcome> {
    info!("analyzing {}", file.display());

    let total_secs = probe::duration_secs(file)?;
    // 比最短指纹还短的视频不做部分比较
    if store.is_empty() || total_secs < shortest_secs {
        return pass_through(file, request);
    }

    // 搜索窗 = 偏移上限 + 最长指纹，封顶到视频实际长度
    let window_secs = (matching.max_intro_secs + longest_secs).min(total_secs);
    let sampler = FrameSampler::new(sample);
    let frames =
        sampler.sample_with_duration(file, 0.0, window_secs, store.sample_rate(), total_secs)?;

    let fingerprinter = Fingerprinter::new(store.metric(), store.sample_rate());
    let features = fingerprinter.features(&frames);

    let matcher = Matcher::new(matching.clone());
    let Some(result) = matcher.find_match(&features, store) else {
        info!("{}: no intro found", file.display());
        return pass_through(file, request);
    };
    info!(
        "{}: intro matched (fingerprint {} offset {:.1}s distance {:.4})",
        file.display(),
        result.fingerprint_index,
        result.offset_secs,
        result.distance
    );

    let keyframes = probe::keyframes(file)?;
    let cut_at = matcher.plan_cut(&result, &keyframes);
    let mode = match matching.snap {
        // 吸附后的剪切点就在关键帧上，stream-copy 安全
        SnapPolicy::Keyframe => TrimMode::StreamCopy,
        SnapPolicy::Exact => trimmer::choose_mode(cut_at, &keyframes),
    };

    let dest = output_path(file, &request.out_dir);
    trimmer::trim(file, &dest, cut_at, mode)?;

    if request.move_back {
        info!("move {} -> {}", dest.display(), file.display());
        move_file(&dest, file)?;
    }
    Ok(FileOutcome::Trimmed)
}

fn pass_through(file: &Path, request: &CutRequest) -> Result<FileOutcome> {
    if request.on_no_match == NoMatchAction::Copy && !request.move_back {
        let dest = output_path(file, &request.out_dir);
        fs::copy(file, dest)?;
    }
    Ok(FileOutcome::NoIntro)
}

fn output_path(file: &Path, out_dir: &Path) -> PathBuf {
    let name = file.file_name().unwrap_or(file.as_os_str());
    out_dir.join(name)
}

/// rename 失败（跨设备）时退化为复制 + 删除
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

/// 展开文件与目录参数，目录递归，按扩展名过滤，结果排序保证确定性
fn collect_inputs(inputs: &[PathBuf], extensions: Option<&[String]>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            walk_dir(input, extensions, &mut files)?;
        } else if has_valid_extension(input, extensions) {
            files.push(input.clone());
        }
    }
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, extensions: Option<&[String]>, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk_dir(&path, extensions, out)?;
        } else if has_valid_extension(&path, extensions) {
            out.push(path);
        }
    }
    Ok(())
}

fn has_valid_extension(path: &Path, extensions: Option<&[String]>) -> bool {
    let Some(extensions) = extensions else {
        return true;
    };
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .map_or(false, |e| extensions.iter().any(|x| *x == e))
}
