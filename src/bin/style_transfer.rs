use std::env;
use std::path::Path;
use std::sync::Arc;
use wct_transfer::checkpoint::CacheDirSource;
use wct_transfer::config::{load_config, TransferToolConfig};
use wct_transfer::diagnostics::TransferReport;
use wct_transfer::image::io::{
    load_rgb_image, rgb_to_feature_map, save_rgb_image, write_json_file,
};
use wct_transfer::StyleTransfer;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path)).map_err(|e| e.to_string())?;

    let content_rgb = load_rgb_image(&config.content).map_err(|e| e.to_string())?;
    let style_rgb = load_rgb_image(&config.style).map_err(|e| e.to_string())?;
    let content_rgb = config.preprocess.apply(&content_rgb);
    let style_rgb = config.preprocess.apply_matching(&style_rgb, &content_rgb);
    let content = rgb_to_feature_map(&content_rgb, config.channel_order);
    let style = rgb_to_feature_map(&style_rgb, config.channel_order);

    let engine = build_engine(&config);
    let (output, report) = engine
        .transfer_with_report(&content, &style, config.params.alpha)
        .map_err(|e| e.to_string())?;

    save_rgb_image(&output, config.channel_order, &config.output.image)
        .map_err(|e| e.to_string())?;
    print_summary(&report);
    println!("Stylized image written to {}", config.output.image.display());

    if let Some(path) = &config.output.report_json {
        write_json_file(path, &report).map_err(|e| e.to_string())?;
        println!("JSON report written to {}", path.display());
    }
    Ok(())
}

fn build_engine(config: &TransferToolConfig) -> StyleTransfer {
    let mut engine = StyleTransfer::untrained(config.topology, config.seed, config.params.clone());
    if let Some(dir) = &config.weight_cache {
        engine = engine.with_weight_source(Arc::new(CacheDirSource::new(dir)));
    }
    if !engine.load_weights(config.weight_name()) {
        eprintln!(
            "Warning: running with untrained weights (seed {}); output will not be meaningful",
            config.seed
        );
    }
    engine
}

fn print_summary(report: &TransferReport) {
    println!("Transfer summary");
    println!("  size: {}x{}", report.input.width, report.input.height);
    println!(
        "  alpha: {:.3} (skip bands {:.3})",
        report.input.alpha, report.input.skip_alpha
    );
    println!("  wct calls: {}", report.wct_calls.len());
    for call in report.truncated_calls() {
        println!(
            "    {}: rank content {}/{} style {}/{}",
            call.stage,
            call.rank.content_rank,
            call.rank.channels,
            call.rank.style_rank,
            call.rank.channels
        );
    }
    println!("  encode_ms: {:.3}", report.timings.total_for("encode"));
    println!("  decode_ms: {:.3}", report.timings.total_for("decode"));
    println!("  total_ms: {:.3}", report.timings.total_ms);
}

fn usage() -> String {
    "Usage: style_transfer <config.json>".to_string()
}
