use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};

use vtrim::core::config::{MatchConfig, SampleConfig, SnapPolicy};
use vtrim::core::fingerprint::MetricKind;
use vtrim::ops::{cut, learn, CutRequest, LearnRequest, NoMatchAction};

#[derive(Parser)]
#[command(name = "vtrim", version, about = "学习片头指纹并批量剪掉重复片头")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MetricArg {
    Phash,
    Histogram,
}

impl From<MetricArg> for MetricKind {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::Phash => MetricKind::Phash,
            MetricArg::Histogram => MetricKind::Histogram,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// 从样本视频学习片头指纹并追加入库
    Learn {
        /// 样本视频
        #[arg(short = 'i', long = "in", env = "VTRIM_IN")]
        input: PathBuf,
        /// 指纹库文件
        #[arg(short = 'd', long = "db", env = "VTRIM_DB", default_value = "clips.db")]
        store: PathBuf,
        /// 片头起始时间（秒）
        #[arg(short = 's', long, default_value_t = 0.0)]
        start: f64,
        /// 片头时长（秒）
        #[arg(short = 't', long = "time")]
        duration: f64,
        /// 采样帧率（仅新建库时生效）
        #[arg(long, default_value_t = 1.0)]
        rate: f64,
        /// 度量族（仅新建库时生效）
        #[arg(long, value_enum, default_value = "phash")]
        metric: MetricArg,
    },
    /// 检测并剪掉片头，输出到目标目录
    Cut {
        /// 输入文件或目录（目录递归）
        #[arg(short = 'i', long = "in", env = "VTRIM_IN", value_delimiter = ',', num_args = 1..)]
        inputs: Vec<PathBuf>,
        /// 指纹库文件
        #[arg(short = 'd', long = "db", env = "VTRIM_DB", default_value = "clips.db")]
        store: PathBuf,
        /// 输出目录
        #[arg(short = 'o', long = "out", env = "VTRIM_OUT", default_value = "out")]
        out_dir: PathBuf,
        /// 视频扩展名过滤，如 "mp4 mkv avi"
        #[arg(short = 'e', long = "ext")]
        extensions: Option<String>,
        /// 接受阈值（平均归一化距离，含等于）
        #[arg(long, default_value_t = 0.12)]
        threshold: f64,
        /// 搜索窗口上限（秒）
        #[arg(long, default_value_t = 300.0)]
        max_intro: f64,
        /// 帧精确剪切（非关键帧边界时重编码），默认吸附关键帧走 stream-copy
        #[arg(long)]
        exact: bool,
        /// 未命中片头时跳过而非复制到输出目录
        #[arg(long)]
        skip_unmatched: bool,
        /// 剪完后把结果移回源路径
        #[arg(short = 'm', long = "move")]
        move_back: bool,
        /// 多文件并行处理
        #[arg(long)]
        parallel: bool,
    },
}

/// vtrim.py 风格的扩展名列表："mp4, mkv .avi" → ["mp4", "mkv", "avi"]
fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split([' ', ',', '.'])
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

fn run(cli: Cli) -> i32 {
    match cli.command {
        Command::Learn {
            input,
            store,
            start,
            duration,
            rate,
            metric,
        } => {
            let sample = SampleConfig {
                rate,
                ..SampleConfig::default()
            };
            let request = LearnRequest {
                source: input,
                store_path: store,
                start_secs: start,
                duration_secs: duration,
                metric: metric.into(),
            };
            match learn(&request, &sample) {
                Ok(count) => {
                    info!("store now holds {} fingerprints", count);
                    0
                }
                Err(e) => {
                    error!("learn failed: {e}");
                    1
                }
            }
        }
        Command::Cut {
            inputs,
            store,
            out_dir,
            extensions,
            threshold,
            max_intro,
            exact,
            skip_unmatched,
            move_back,
            parallel,
        } => {
            let matching = MatchConfig {
                threshold,
                max_intro_secs: max_intro,
                snap: if exact {
                    SnapPolicy::Exact
                } else {
                    SnapPolicy::Keyframe
                },
            };
            let request = CutRequest {
                inputs,
                store_path: store,
                out_dir,
                extensions: extensions.as_deref().map(parse_extensions),
                on_no_match: if skip_unmatched {
                    NoMatchAction::Skip
                } else {
                    NoMatchAction::Copy
                },
                move_back,
                parallel,
            };
            match cut(&request, &SampleConfig::default(), &matching) {
                // 有未命中或失败的文件时退出码非零，批次本身不中断
                Ok(report) if report.is_full_success() => 0,
                Ok(_) => 1,
                Err(e) => {
                    error!("cut aborted: {e}");
                    1
                }
            }
        }
    }
}

fn main() {
    vtrim::init_logging();
    let cli = Cli::parse();
    std::process::exit(run(cli));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extensions() {
        assert_eq!(parse_extensions("mp4 mkv avi"), vec!["mp4", "mkv", "avi"]);
        assert_eq!(parse_extensions(".MP4,mkv"), vec!["mp4", "mkv"]);
        assert!(parse_extensions("  ").is_empty());
    }
}
