//! tlb-sim: 交互式 TLB 地址翻译
//!
//! 每行输入一个虚拟地址（十进制、0x 十六进制或 0b 二进制），
//! 输入 `r` 清空 TLB，输入 `s` 退出。

mod commands;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use vm_tlb::{PageMapping, SoftMmu, TlbConfig};

use commands::{TranslationSession, parse_number};

#[derive(Parser, Debug)]
#[command(name = "tlb-sim", version, about = "FIFO TLB address translation session")]
struct CliArgs {
    /// 配置文件（TOML，.json 后缀按 JSON 解析）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// TLB 条目数
    #[arg(long)]
    capacity: Option<usize>,

    /// 页大小（2 的幂）
    #[arg(long)]
    page_size: Option<u64>,

    /// 虚拟地址位宽
    #[arg(long)]
    address_bits: Option<u32>,

    /// 追加页表映射，格式 PAGE=FRAME，可重复
    #[arg(long = "map", value_parser = parse_mapping)]
    mappings: Vec<PageMapping>,

    /// 每条结果输出一行 JSON
    #[arg(long)]
    json: bool,

    /// 每次翻译后打印 TLB 内容
    #[arg(long)]
    dump: bool,
}

fn parse_mapping(text: &str) -> Result<PageMapping, String> {
    let (page, frame) = text
        .split_once('=')
        .ok_or_else(|| format!("expected PAGE=FRAME, got {:?}", text))?;
    Ok(PageMapping::new(parse_number(page)?, parse_number(frame)?))
}

fn build_config(args: &CliArgs) -> Result<TlbConfig> {
    let mut config = match &args.config {
        Some(path) => TlbConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TlbConfig::default(),
    };

    if let Some(capacity) = args.capacity {
        config.capacity = capacity;
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    if let Some(address_bits) = args.address_bits {
        config.address_bits = address_bits;
    }
    config.mappings.extend(args.mappings.iter().copied());
    Ok(config)
}

fn main() -> Result<()> {
    // 初始化日志
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let config = build_config(&args)?;
    let mmu = SoftMmu::from_config(&config).context("Invalid TLB configuration")?;

    let geometry = mmu.geometry();
    info!(
        "TLB: {} entries, page size {} ({} page bits, {} offset bits)",
        mmu.cache().capacity(),
        geometry.page_size(),
        geometry.page_bits(),
        geometry.offset_bits()
    );

    let mut session = TranslationSession::new(mmu, args.json, args.dump);
    let stdin = io::stdin();
    session.run(stdin.lock(), io::stdout().lock())
}
