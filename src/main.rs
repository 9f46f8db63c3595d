// file IO
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
// argparse dependency
use clap::Parser;
// collections
use indexmap::IndexMap;
// error handling
use anyhow::Result;
// logging
use log::debug;
use serde::{Deserialize, Serialize};

use pipescope::autodetect::autodetect;
use pipescope::constants::Constants;
use pipescope::report::{decode_cycle, render_text, Layout, RawWords};
use pipescope::signal::CycleSnapshot;

#[derive(Clone, Parser)]
#[command(
    name = "pipescope",
    version = "0.1.0",
    about = "Decode bit-packed core state snapshots"
)]
struct Args {
    // snapshot JSON files, one per captured cycle
    snapshots: Vec<String>,
    // optional JSON config file for constants and scope layout
    #[arg(long)]
    config: Option<String>,
    // constant overrides applied after the config file
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,
    // measure structural sizes from the first snapshot before decoding
    #[arg(long)]
    autodetect: Option<bool>,
    // emit the decoded state as JSON instead of text
    #[arg(long)]
    to_json: Option<bool>,
    // write the report to this file instead of stdout
    #[arg(long)]
    output: Option<String>,
    // optionally write the merged constants and layout to JSON
    #[arg(long)]
    dump_effective_config: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
struct DecoderStaticCfg {
    constants: IndexMap<String, u64>,
    layout: Layout,
    autodetect: bool,
    to_json: bool,
    output: Option<String>,
}

fn load_file_config(path: &str) -> Result<DecoderStaticCfg> {
    let text = fs::read_to_string(path)?;
    let cfg = serde_json::from_str(&text)
        .map_err(|err| anyhow::anyhow!("config file `{}`: {}", path, err))?;
    Ok(cfg)
}

fn parse_override(arg: &str) -> Result<(String, u64)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected NAME=VALUE, got `{}`", arg))?;
    let value = match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16)?,
        None => value.parse::<u64>()?,
    };
    Ok((name.to_string(), value))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // If a config file is supplied, it seeds constants and the scope layout
    // (CLI --set still wins for individual constants).
    let file_cfg = if let Some(path) = &args.config {
        load_file_config(path)?
    } else {
        DecoderStaticCfg::default()
    };

    fn pick_arg<T: Clone>(cli: Option<T>, file: T) -> T {
        cli.unwrap_or(file)
    }

    let run_autodetect = pick_arg(args.autodetect, file_cfg.autodetect);
    let to_json = pick_arg(args.to_json, file_cfg.to_json);
    let output = args.output.clone().or(file_cfg.output.clone());
    let layout = file_cfg.layout;

    let mut cfg = Constants::new();
    for (name, value) in &file_cfg.constants {
        cfg.set(name, *value)?;
    }
    for arg in &args.set {
        let (name, value) = parse_override(arg)?;
        cfg.set(&name, value)?;
    }

    if args.snapshots.is_empty() {
        return Err(anyhow::anyhow!("no snapshot files given"));
    }
    for path in &args.snapshots {
        if !Path::new(path).is_file() {
            return Err(anyhow::anyhow!("snapshot file is not valid: {}", path));
        }
    }

    let mut out: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut detected = !run_autodetect;
    for (i, path) in args.snapshots.iter().enumerate() {
        debug!("[{}] decoding {}", i, path);
        let text = fs::read_to_string(path)?;
        let snapshot = CycleSnapshot::parse(&text)
            .map_err(|err| anyhow::anyhow!("snapshot `{}`: {}", path, err))?;
        let root = snapshot.root()?;
        if !detected {
            autodetect(root, &layout, &mut cfg)?;
            detected = true;
        }
        let report = decode_cycle(root, &layout, &cfg, snapshot.cycle.clone())?;
        if to_json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|err| anyhow::anyhow!("serializing report: {}", err))?;
            writeln!(out, "{}", json)?;
        } else {
            render_text(&mut *out, &report, &RawWords)?;
        }
    }
    out.flush()?;

    // the effective config includes anything autodetect measured
    if let Some(path) = &args.dump_effective_config {
        let merged = DecoderStaticCfg {
            constants: cfg.iter().map(|(k, v)| (k.to_string(), v)).collect(),
            layout: layout.clone(),
            autodetect: run_autodetect,
            to_json,
            output: output.clone(),
        };
        let json = serde_json::to_string_pretty(&merged)
            .map_err(|err| anyhow::anyhow!("serializing config: {}", err))?;
        fs::write(path, json)?;
    }

    if !to_json || output.is_some() {
        println!("[Success] Decoded {} snapshots", args.snapshots.len());
    }
    Ok(())
}
