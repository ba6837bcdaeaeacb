use anyhow::{bail, Context, Result};
use clap::Parser;
use img_smartpress::cli::{Args, Commands};
use img_smartpress::constants::{
    COMPRESSED_SIZE_PREFIX, COMPRESSION_RATIO_PREFIX, ERROR_PREFIX, INFO_PREFIX,
    ORIGINAL_SIZE_PREFIX, SUCCESS_PREFIX, WARNING_PREFIX,
};
use img_smartpress::utils::format_file_size;
use img_smartpress::{
    logging, print_report, BatchResult, CompressOutcome, CompressionOptions, CompressionResult,
    Engine, EngineConfig, MultiFormatResult,
};
use std::path::Path;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.quiet, args.verbose);
    let quiet = args.quiet;

    match args.command {
        Commands::Compress {
            input,
            output,
            formats,
            quality,
            width,
            height,
            no_recursive,
            threads,
            config,
            json,
            progress,
        } => {
            let engine = build_engine(config.as_deref())?;
            let formats = if formats.is_empty() { None } else { Some(formats) };
            let options = CompressionOptions::new(formats, quality, width, height)?
                .with_output(output)
                .with_recursive(!no_recursive)
                .with_workers(threads)
                .with_progress(progress && !json);

            if !json && !quiet {
                println!("🗜️  Compressing: {}", input.display());
            }
            let outcome = engine
                .compress(&input, &options)
                .with_context(|| format!("failed to compress {}", input.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else if !quiet {
                print_outcome(&outcome);
            }

            if !outcome.success() {
                bail!("no image was compressed successfully");
            }
        }
        Commands::Analyze {
            input,
            config,
            json,
        } => {
            let engine = build_engine(config.as_deref())?;
            let report = engine
                .analyze(&input)
                .with_context(|| format!("failed to analyze {}", input.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}

fn build_engine(config_path: Option<&Path>) -> Result<Engine> {
    let config = match config_path {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    Ok(Engine::new(config)?)
}

fn print_outcome(outcome: &CompressOutcome) {
    match outcome {
        CompressOutcome::Single(result) => print_single(result),
        CompressOutcome::MultiFormat(multi) => print_multi(multi),
        CompressOutcome::Batch(batch) => print_batch(batch),
    }
}

fn print_single(result: &CompressionResult) {
    if !result.success {
        print_failure(result);
        return;
    }

    if let Some(path) = &result.output_path {
        println!("📁 Output: {}", path.display());
    }
    match (result.original_dimensions, result.final_dimensions) {
        (Some((w, h)), Some((fw, fh))) if result.was_resized => println!(
            "{} {} ({}x{} -> {}x{})",
            ORIGINAL_SIZE_PREFIX,
            format_file_size(result.original_size),
            w,
            h,
            fw,
            fh
        ),
        (Some((w, h)), _) => println!(
            "{} {} ({}x{})",
            ORIGINAL_SIZE_PREFIX,
            format_file_size(result.original_size),
            w,
            h
        ),
        _ => println!("{} {}", ORIGINAL_SIZE_PREFIX, format_file_size(result.original_size)),
    }
    println!("{} {}", COMPRESSED_SIZE_PREFIX, format_file_size(result.compressed_size));
    println!("{} {:.1}%", COMPRESSION_RATIO_PREFIX, result.compression_ratio());

    if result.kept_original {
        println!("{}  No smaller encoding found, original kept", WARNING_PREFIX);
    } else {
        let format = result
            .format_used
            .map(|kind| kind.to_string())
            .unwrap_or_default();
        let quality = result
            .quality_used
            .map(|q| format!(" at quality {}", q))
            .unwrap_or_else(|| " lossless".to_string());
        println!(
            "{} Reduced by {:.1}% as {}{}",
            SUCCESS_PREFIX,
            result.compression_ratio(),
            format,
            quality
        );
    }
}

fn print_multi(multi: &MultiFormatResult) {
    println!("{} {} formats for {}", INFO_PREFIX, multi.results.len(), multi.input_path.display());
    for result in &multi.results {
        if result.success {
            println!("  {} {}", SUCCESS_PREFIX, result.summary());
        } else {
            println!("  {} {}", ERROR_PREFIX, result.summary());
        }
    }
    if let Some(best) = multi.best_result() {
        if let Some(path) = &best.output_path {
            println!("🏆 Smallest: {}", path.display());
        }
    }
}

fn print_batch(batch: &BatchResult) {
    println!("\n📊 Batch Compression Summary:");
    println!("  📁 Total files processed: {}", batch.results.len());
    println!("  {} Succeeded: {}", SUCCESS_PREFIX, batch.success_count());
    println!("  📊 Total original size: {}", format_file_size(batch.total_original_size()));
    println!("  📊 Total compressed size: {}", format_file_size(batch.total_compressed_size()));
    println!("  💾 Total saved: {}", format_file_size(batch.total_size_saved()));
    println!("  🎯 Overall compression ratio: {:.1}%", batch.overall_compression_ratio());
    println!("  📈 Success rate: {:.2}%", batch.success_rate());

    if batch.failure_count() > 0 {
        println!("  {}  Failed files: {}", WARNING_PREFIX, batch.failure_count());
        for result in batch.results.iter().filter(|r| !r.success) {
            println!("    {} {}", ERROR_PREFIX, result.summary());
        }
    }
}

fn print_failure(result: &CompressionResult) {
    match &result.error {
        Some(error) => println!("{} {}: {}", ERROR_PREFIX, result.input_path.display(), error),
        None => println!("{} {}", ERROR_PREFIX, result.input_path.display()),
    }
}
