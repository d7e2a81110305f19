use anyhow::{Context, Result};
use clap::Parser;
use dercarve_core::{load_buffer, scan_and_write, CarveOptions, DecoderRegistry};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "dercarve", version, about = "从二进制镜像中雕刻 DER 证书与密钥")]
struct Cli {
    /// 输入文件（内存转储、磁盘镜像、固件等）
    input: PathBuf,

    /// 线程数（"auto"=CPU 核心数）
    #[arg(long, default_value = "auto")]
    threads: String,
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    // 读取失败直接退出，不做任何扫描
    let buf = load_buffer(&cli.input).context("load input file")?;
    info!(input = ?cli.input, bytes = buf.len(), "starting scan");

    let opts = CarveOptions { threads: parse_threads(&cli.threads) };
    let registry = DecoderRegistry::standard();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let stats = scan_and_write(&buf, &registry, &mut out, &opts).context("scan failed")?;
    out.flush().context("flush output")?;

    info!(candidates = stats.candidates, work_items = stats.work_items, findings = stats.findings, "scan finished");
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志写到 stderr，stdout 只输出结果行
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).with_writer(io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析线程参数
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") { return None; }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}
