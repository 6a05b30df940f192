// src/main.rs
// Command-line application for FDF Reader

use std::env;
use std::process;
use fdf_reader::{FdfFile, LoadOptions};

fn print_usage() {
    eprintln!("Usage: fdf_reader <command> <fdf_file> [options] [--strict]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  info <file>              Display FDF header and data summary");
    eprintln!("  convert <file> <output>  Convert FDF samples to CSV");
    eprintln!("  extract <file>           Print time, value pairs to stdout");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --strict                 Reject files with a bad magic");
    eprintln!();
    eprintln!("Set RUST_LOG=debug to trace every decoded header field.");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  fdf_reader info capture.fdf");
    eprintln!("  fdf_reader convert capture.fdf output.csv");
    eprintln!("  fdf_reader extract capture.fdf --strict > samples.txt");
}

fn main() {
    env_logger::init();

    let mut args: Vec<String> = env::args().collect();
    let strict = args.iter().any(|a| a == "--strict");
    args.retain(|a| a != "--strict");

    if args.len() < 3 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];
    let input_file = &args[2];

    let options = LoadOptions::new().strict_magic(strict);
    let fdf = match FdfFile::open_with(input_file, &options) {
        Ok(fdf) => fdf,
        Err(e) => {
            eprintln!("Error loading FDF file '{}' ({:?}): {}", input_file, e.kind(), e);
            process::exit(1);
        }
    };

    match command.as_str() {
        "info" => {
            print_file_info(input_file, &fdf);
        }

        "convert" => {
            if args.len() < 4 {
                eprintln!("Error: Missing output file argument");
                print_usage();
                process::exit(1);
            }

            let output_file = &args[3];
            if let Err(e) = fdf.write_csv(output_file) {
                eprintln!("Error writing CSV file '{}': {}", output_file, e);
                process::exit(1);
            }

            println!("Successfully converted {} to {}", input_file, output_file);
            println!("Total samples written: {}", fdf.samples().len());
        }

        "extract" => {
            println!("# Samples from {}", input_file);
            match fdf.time_values() {
                Some(times) => {
                    println!("# Time (s), Value ({})", fdf.header().units);
                    for (&t, &value) in times.iter().zip(fdf.samples()) {
                        println!("{:.12e}, {:.6e}", t, value);
                    }
                }
                None => {
                    println!("# Index, Value ({})", fdf.header().units);
                    for (i, &value) in fdf.samples().iter().enumerate() {
                        println!("{}, {:.6e}", i, value);
                    }
                }
            }
        }

        _ => {
            eprintln!("Error: Unknown command '{}'", command);
            print_usage();
            process::exit(1);
        }
    }
}

fn print_file_info(input_file: &str, fdf: &FdfFile) {
    let header = fdf.header();
    let data = fdf.data();

    println!("FDF File Information");
    println!("====================");
    println!();
    println!("File: {}", input_file);
    println!("File type: {}", header.file_type);
    println!("Header: {}", header.header_name);
    println!();

    println!("Calibration:");
    println!("  Zero crossing voltage: {}", header.zero_crossing_voltage);
    println!("  Volts per channel: {}", header.volts_per_channel);
    println!("  ADC bits: {}", header.nbits);
    println!("  Units: {}", header.units);
    println!();

    println!("Time Scaling:");
    println!("  t0: {}", header.t0);
    println!("  dt: {}", header.dt);
    if let Some(dt) = header.dt_seconds().filter(|&dt| dt > 0.0) {
        println!("  Sample rate: {:.3} MHz", 1.0 / dt / 1e6);
        println!("  Duration: {:.6e} s", data.samples.len() as f64 * dt);
    }
    println!();

    println!("Data Section:");
    println!("  Element type: {}", data.fdf_type);
    println!("  Dimensions: {:?}", data.dims);
    println!("  Samples: {}", data.samples.len());

    if !data.samples.is_empty() {
        let min = data.samples.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = data.samples.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let avg = data.samples.iter().sum::<f64>() / data.samples.len() as f64;

        println!("  Range: {:.6} to {:.6} {}", min, max, header.units);
        println!("  Mean: {:.6} {}", avg, header.units);
    }
}
