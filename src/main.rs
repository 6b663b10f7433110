use std::path::PathBuf;

use clap::Parser;
use stock_nester::aggregate::Summary;
use stock_nester::types::{
    DemandRequest, FreeHeuristic, NestingMode, PackingProfile, SearchLimits, StockUnit,
};
use stock_nester::{NestingRequest, Outcome, Solver};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "stock_nester",
    about = "Cutting-stock nesting optimizer for sheets and lengths"
)]
struct Cli {
    /// Stock units as [ID=]WxL, or [ID=]L with --linear (e.g. ply=2440x1220)
    #[arg(long, num_args = 1.., conflicts_with = "input")]
    stock: Vec<String>,

    /// Pieces as [NAME=]WxL:qty, or [NAME=]L:qty with --linear (e.g. 800x600:3)
    #[arg(long = "cuts", num_args = 1.., conflicts_with = "input")]
    cuts: Vec<String>,

    /// Read the whole request from a JSON file instead
    #[arg(long)]
    input: Option<PathBuf>,

    /// Minimum gap between pieces
    #[arg(long, default_value_t = 0)]
    margin: u32,

    /// Minimum distance from the stock edges
    #[arg(long, default_value_t = 0)]
    border: u32,

    /// Only axis-aligned guillotine rows, no rotation
    #[arg(long)]
    straight_cuts: bool,

    /// Free placement heuristic: max-rects or guillotine
    #[arg(long, default_value = "max-rects", value_parser = parse_heuristic)]
    heuristic: FreeHeuristic,

    /// Nest lengths (bars, profiles) instead of sheets
    #[arg(long)]
    linear: bool,

    /// Stop the search after this many packing steps
    #[arg(long)]
    max_steps: Option<u64>,

    /// Stop the search after this many milliseconds
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_heuristic(s: &str) -> Result<FreeHeuristic, String> {
    match s {
        "max-rects" => Ok(FreeHeuristic::MaxRects),
        "guillotine" => Ok(FreeHeuristic::Guillotine),
        _ => Err(format!(
            "invalid heuristic '{}', expected: max-rects or guillotine",
            s
        )),
    }
}

fn parse_number(s: &str, what: &str, input: &str) -> Result<u32, String> {
    s.parse::<u32>()
        .map_err(|_| format!("invalid {} in '{}'", what, input))
}

/// Splits an optional `NAME=` prefix.
fn split_label(s: &str) -> (Option<&str>, &str) {
    match s.split_once('=') {
        Some((label, rest)) if !label.is_empty() => (Some(label), rest),
        _ => (None, s),
    }
}

/// `WxL`, or a bare length in linear mode. Returns (width, length).
fn parse_dimensions(s: &str, linear: bool) -> Result<(u32, u32), String> {
    if linear {
        let length = parse_number(s, "length", s)?;
        if length == 0 {
            return Err(format!("length must be non-zero in '{}'", s));
        }
        return Ok((0, length));
    }
    let Some((w, l)) = s.split_once('x') else {
        return Err(format!("invalid dimensions '{}', expected WxL", s));
    };
    let width = parse_number(w, "width", s)?;
    let length = parse_number(l, "length", s)?;
    if width == 0 || length == 0 {
        return Err(format!("dimensions must be non-zero in '{}'", s));
    }
    Ok((width, length))
}

fn parse_stock(s: &str, index: usize, linear: bool) -> Result<StockUnit, String> {
    let (label, dims) = split_label(s);
    let (width, length) = parse_dimensions(dims, linear)?;
    let id = label.map_or_else(|| format!("S{}", index + 1), str::to_string);
    Ok(StockUnit::new(id, width, length))
}

fn parse_cut(s: &str, index: usize, linear: bool) -> Result<DemandRequest, String> {
    let (label, rest) = split_label(s);
    let Some((dims, qty)) = rest.split_once(':') else {
        return Err(format!("invalid cut '{}', expected WxL:qty", s));
    };
    let (width, length) = parse_dimensions(dims, linear)?;
    let qty = parse_number(qty, "quantity", s)?;
    if qty == 0 {
        return Err(format!("quantity must be non-zero in '{}'", s));
    }
    let id = label.map_or_else(|| format!("P{}", index + 1), str::to_string);
    Ok(DemandRequest::new(id, width, length, qty))
}

fn build_request(cli: &Cli) -> Result<NestingRequest, String> {
    let mut request = match &cli.input {
        Some(path) => {
            let body = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            serde_json::from_str::<NestingRequest>(&body)
                .map_err(|e| format!("invalid request in {}: {}", path.display(), e))?
        }
        None => {
            let stock = cli
                .stock
                .iter()
                .enumerate()
                .map(|(i, s)| parse_stock(s, i, cli.linear))
                .collect::<Result<Vec<_>, _>>()?;
            let demand = cli
                .cuts
                .iter()
                .enumerate()
                .map(|(i, c)| parse_cut(c, i, cli.linear))
                .collect::<Result<Vec<_>, _>>()?;
            NestingRequest {
                mode: if cli.linear {
                    NestingMode::Linear
                } else {
                    NestingMode::Sheet
                },
                stock,
                demand,
                profile: PackingProfile {
                    margin_gap: cli.margin,
                    border_inset: cli.border,
                    straight_cuts_only: cli.straight_cuts,
                    heuristic: cli.heuristic,
                },
                limits: SearchLimits::default(),
            }
        }
    };
    if cli.max_steps.is_some() {
        request.limits.max_steps = cli.max_steps;
    }
    if cli.time_limit_ms.is_some() {
        request.limits.time_limit_ms = cli.time_limit_ms;
    }
    Ok(request)
}

fn print_summary(summary: &Summary) {
    for (i, layout) in summary.layouts.iter().enumerate() {
        println!("Stock {} #{} ({}):", layout.name, i + 1, layout.size_label);
        for p in &layout.placements {
            let rot = if p.rotated { " [rotated]" } else { "" };
            println!(
                "  {} {}x{} @ ({}, {}){}",
                p.piece.name, p.placed_width, p.placed_length, p.x, p.y, rot
            );
        }
        println!();
    }

    for usage in &summary.stock_usage {
        println!("  {} x{} ({})", usage.name, usage.count, usage.size_label);
    }
    let count = summary.sheet_count();
    print!(
        "Summary: {} unit{} used, {:.1}% waste",
        count,
        if count == 1 { "" } else { "s" },
        summary.waste_percent,
    );
    if let Some(price) = summary.total_price {
        print!(", cost {:.2}", price);
    }
    println!();
    if summary.stats.aborted {
        println!("Note: search limit reached, result may not be optimal");
    }
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();

    let request = build_request(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let outcome = Solver::new(request).solve().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if cli.json {
        match serde_json::to_string_pretty(&outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        if !matches!(outcome, Outcome::Complete(_)) {
            std::process::exit(1);
        }
        return;
    }

    if let Outcome::Infeasible(report) = &outcome {
        for piece in &report.unusable_pieces {
            eprintln!(
                "  {} {}x{} fits none of {} stock unit(s)",
                piece.name,
                piece.width,
                piece.length,
                report.considered_stock.len()
            );
        }
    }
    match outcome.into_result() {
        Ok(summary) => print_summary(&summary),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stock_with_and_without_label() {
        let s = parse_stock("ply=2440x1220", 0, false).unwrap();
        assert_eq!((s.id.as_str(), s.width, s.length), ("ply", 2440, 1220));
        let s = parse_stock("1000x500", 2, false).unwrap();
        assert_eq!(s.id, "S3");
        let s = parse_stock("bar=6000", 0, true).unwrap();
        assert_eq!((s.width, s.length), (0, 6000));
        assert!(parse_stock("0x100", 0, false).is_err());
        assert!(parse_stock("100", 0, false).is_err());
    }

    #[test]
    fn test_parse_cut() {
        let c = parse_cut("shelf=800x300:4", 0, false).unwrap();
        assert_eq!(c, DemandRequest::new("shelf", 800, 300, 4));
        let c = parse_cut("900:2", 1, true).unwrap();
        assert_eq!(c, DemandRequest::new("P2", 0, 900, 2));
        assert!(parse_cut("800x300:0", 0, false).is_err());
        assert!(parse_cut("800x300", 0, false).is_err());
    }

    #[test]
    fn test_parse_heuristic() {
        assert_eq!(parse_heuristic("guillotine"), Ok(FreeHeuristic::Guillotine));
        assert!(parse_heuristic("skyline").is_err());
    }
}
