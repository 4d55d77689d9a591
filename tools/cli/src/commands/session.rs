//! # Translation Session
//!
//! Reads one virtual address per line and prints the translation report.

use std::io::{BufRead, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use log::{info, warn};
use serde_json::json;
use vm_tlb::report::parse_binary;
use vm_tlb::{CacheDump, InvalidPageReport, SoftMmu, TlbError, TranslationReport};

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// `s` / `S` ends the session
    Quit,
    /// `r` / `R` flushes the TLB and clears the counters
    Reset,
    Address(u64),
    Invalid(String),
}

/// Parse a number: decimal, hex with `0x`, or binary with `0b`
pub fn parse_number(text: &str) -> Result<u64, String> {
    let text = text.trim();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        parse_binary(bin)
    } else {
        text.parse().ok()
    };
    parsed.ok_or_else(|| format!("invalid number {:?}", text))
}

/// Parse one input line
pub fn parse_input(line: &str) -> SessionInput {
    let text = line.trim();
    if text.starts_with(['s', 'S']) {
        return SessionInput::Quit;
    }
    if text.eq_ignore_ascii_case("r") {
        return SessionInput::Reset;
    }

    match parse_number(text) {
        Ok(address) => SessionInput::Address(address),
        Err(_) => SessionInput::Invalid(text.to_string()),
    }
}

/// Interactive session over a single MMU
pub struct TranslationSession {
    mmu: SoftMmu,
    json: bool,
    dump: bool,
}

impl TranslationSession {
    pub fn new(mmu: SoftMmu, json: bool, dump: bool) -> Self {
        Self { mmu, json, dump }
    }

    pub fn mmu(&self) -> &SoftMmu {
        &self.mmu
    }

    /// Run until `s` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<()> {
        let mut lines = input.lines();
        loop {
            if !self.json {
                write!(out, "Enter virtual address: ")?;
                out.flush()?;
            }

            let Some(line) = lines.next() else {
                break;
            };
            let line = line.context("Failed to read input")?;
            if line.trim().is_empty() {
                continue;
            }

            match parse_input(&line) {
                SessionInput::Quit => {
                    if !self.json {
                        writeln!(out, "Good bye!")?;
                    }
                    break;
                }
                SessionInput::Invalid(text) => {
                    warn!("Ignoring unparsable input {:?}", text);
                    if self.json {
                        writeln!(out, "{}", json!({ "error": "invalid_input", "input": text }))?;
                    } else {
                        writeln!(out, "Invalid address: {}", text)?;
                    }
                }
                SessionInput::Reset => {
                    self.mmu.reset_cache();
                    self.mmu.reset_stats();
                    info!("TLB flushed");
                    if self.json {
                        writeln!(out, "{}", json!({ "event": "reset" }))?;
                    } else {
                        writeln!(out, "TLB flushed")?;
                    }
                }
                SessionInput::Address(address) => self.translate_one(address, &mut out)?,
            }
        }

        let stats = self.mmu.stats();
        info!(
            "Session finished: {} hits, {} misses, {} evictions, hit rate {:.2}",
            stats.hits,
            stats.misses,
            stats.evictions,
            stats.hit_rate()
        );
        Ok(())
    }

    fn translate_one<W: Write>(&mut self, address: u64, out: &mut W) -> Result<()> {
        let start = Instant::now();
        let result = self.mmu.translate(address);
        let elapsed = start.elapsed();

        match result {
            Ok(record) => {
                if self.json {
                    writeln!(out, "{}", serde_json::to_string(&record)?)?;
                } else {
                    writeln!(out, "{}", TranslationReport::new(&record, self.mmu.geometry()))?;
                }
            }
            Err(TlbError::InvalidPage { page }) => {
                if self.json {
                    writeln!(
                        out,
                        "{}",
                        json!({ "error": "invalid_page", "virtual_address": address, "virtual_page": page })
                    )?;
                } else {
                    writeln!(out, "{}", InvalidPageReport::new(address, self.mmu.geometry()))?;
                }
            }
            Err(err) => return Err(err.into()),
        }

        if self.dump && !self.json {
            writeln!(out, "{}", CacheDump::new(self.mmu.cache()))?;
        }
        if !self.json {
            writeln!(out, "Time: {:.6} s", elapsed.as_secs_f64())?;
            writeln!(out)?;
        }
        Ok(())
    }
}
