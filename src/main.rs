use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use posturelab::analysis::AnalysisType;
use posturelab::{Analyzer, Config, Landmark};
use serde::Serialize;
use std::fmt::Display;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::{debug, info};

const CONFIG_PATH: &str = "config.toml";

/// 33点ランドマークから姿勢・フォーム・エルゴノミクスを解析する
#[derive(Parser, Debug)]
#[command(name = "posturelab")]
#[command(version)]
struct Args {
    /// 閾値設定ファイル (TOML)
    #[arg(long, global = true, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// 入力を JSON Lines（1行1フレーム）として扱う
    #[arg(long, global = true)]
    batch: bool,

    /// debug ログを出す
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 姿勢レポートを出力
    Posture {
        /// ランドマーク JSON ファイル（`-` で標準入力）
        input: String,
    },
    /// 活動状態と、指定があればフォーム解析を出力
    Detect {
        input: String,

        /// squat | pushup | plank | ergonomics
        #[arg(long, default_value = "")]
        analysis_type: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .init();

    let config = Config::load_or_default(&args.config);
    let analyzer = Analyzer::new(&config);

    match &args.command {
        Command::Posture { input } => {
            let text = read_input(input)?;
            if args.batch {
                let frames = parse_lines(&text);
                let valid = valid_frames(&frames);
                info!("analyzing {} frames", valid.len());
                emit_batch(&frames, analyzer.posture_batch(&valid))?;
            } else {
                let landmarks = parse_frame(&text)?;
                let report = analyzer.posture(&landmarks)?;
                emit(&report)?;
            }
        }
        Command::Detect {
            input,
            analysis_type,
        } => {
            let analysis_type = AnalysisType::from_token(analysis_type)?;
            debug!(?analysis_type, "detect");
            let text = read_input(input)?;
            if args.batch {
                let frames = parse_lines(&text);
                let valid = valid_frames(&frames);
                info!("analyzing {} frames", valid.len());
                emit_batch(&frames, analyzer.detect_batch(&valid, analysis_type))?;
            } else {
                let landmarks = parse_frame(&text)?;
                let result = analyzer.detect(&landmarks, analysis_type)?;
                emit(&result)?;
            }
        }
    }

    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input))
    }
}

fn parse_frame(text: &str) -> Result<Vec<Landmark>> {
    serde_json::from_str(text).context("input is not a landmark array")
}

/// 空行は無視。JSONとして読めない行もエラー行として位置を保つ
fn parse_lines(text: &str) -> Vec<Result<Vec<Landmark>, serde_json::Error>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line))
        .collect()
}

fn valid_frames(frames: &[Result<Vec<Landmark>, serde_json::Error>]) -> Vec<Vec<Landmark>> {
    frames
        .iter()
        .filter_map(|frame| frame.as_ref().ok().cloned())
        .collect()
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn emit_batch<T: Serialize, E: Display>(
    frames: &[Result<Vec<Landmark>, serde_json::Error>],
    results: Vec<Result<T, E>>,
) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut results = results.into_iter();
    for frame in frames {
        let line = match frame {
            Err(e) => serde_json::json!({ "error": e.to_string() }),
            Ok(_) => match results.next() {
                Some(Ok(value)) => serde_json::to_value(&value)?,
                Some(Err(e)) => serde_json::json!({ "error": e.to_string() }),
                None => break,
            },
        };
        serde_json::to_writer(&mut out, &line)?;
        writeln!(out)?;
    }
    Ok(())
}
