use chromalign::{
    align_anchored, Anchor, Cosine, CostFunction, Dot, DtwParams, Euclidean, Manhattan, Run,
    TimePenalized, Weights,
};
use clap::{App, Arg};
#[macro_use]
extern crate log;

fn main() -> std::io::Result<()> {
    let matches = App::new("chromalign")
        .version("0.3")
        .about("Align two chromatographic runs (TSV: time, then intensities) by banded DTW.")
        .setting(clap::AppSettings::ArgRequiredElseHelp)
        .arg(
            Arg::with_name("reference")
                .value_name("REFERENCE")
                .required(true)
                .index(1)
                .help("Reference run. TSV, one scan per line."),
        )
        .arg(
            Arg::with_name("query")
                .value_name("QUERY")
                .required(true)
                .index(2)
                .help("Query run. TSV, one scan per line."),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Debug mode"),
        )
        .arg(
            Arg::with_name("metric")
                .long("metric")
                .takes_value(true)
                .default_value("euclidean")
                .possible_values(&["euclidean", "manhattan", "dot", "cosine"])
                .help("Local cost function."),
        )
        .arg(
            Arg::with_name("time_tolerance")
                .long("time_tolerance")
                .takes_value(true)
                .help("Penalize retention-time drift with this Gaussian tolerance."),
        )
        .arg(
            Arg::with_name("anchors")
                .long("anchors")
                .short("a")
                .value_name("TSV")
                .takes_value(true)
                .help("Trusted (reference, query) scan pairs. TSV, one per line."),
        )
        .arg(
            Arg::with_name("radius")
                .long("radius")
                .takes_value(true)
                .default_value("10")
                .help("Corridor half-width around the anchor line."),
        )
        .arg(
            Arg::with_name("band_width")
                .long("band_width")
                .takes_value(true)
                .default_value("1.0")
                .help("Extra corridor width as a fraction of the query length."),
        )
        .arg(
            Arg::with_name("no_global_band")
                .long("no_global_band")
                .help("Keep the corridor tight around the anchors."),
        )
        .arg(
            Arg::with_name("gap_penalty")
                .long("gap_penalty")
                .takes_value(true)
                .default_value("0.0")
                .help("Additive penalty on compression and expansion steps."),
        )
        .arg(
            Arg::with_name("min_anchor_spacing")
                .long("min_anchor_spacing")
                .takes_value(true)
                .default_value("10")
                .help("Minimum reference-scan gap between kept anchors."),
        )
        .arg(
            Arg::with_name("no_precompute")
                .long("no_precompute")
                .help("Evaluate local costs during the recurrence instead."),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .short("t")
                .takes_value(true)
                .default_value("1")
                .help("Worker threads for local-cost precomputation."),
        )
        .get_matches();
    let level = match matches.occurrences_of("verbose") {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    let reference = read_run(matches.value_of("reference").unwrap())?;
    let query = read_run(matches.value_of("query").unwrap())?;
    let anchors = match matches.value_of("anchors") {
        Some(path) => read_anchors(path)?,
        None => vec![],
    };
    let radius: usize = matches
        .value_of("radius")
        .and_then(|e| e.parse().ok())
        .unwrap();
    let band_width: f64 = matches
        .value_of("band_width")
        .and_then(|e| e.parse().ok())
        .unwrap();
    let gap_penalty: f64 = matches
        .value_of("gap_penalty")
        .and_then(|e| e.parse().ok())
        .unwrap();
    let min_anchor_spacing: usize = matches
        .value_of("min_anchor_spacing")
        .and_then(|e| e.parse().ok())
        .unwrap();
    let threads: usize = matches
        .value_of("threads")
        .and_then(|e| e.parse().ok())
        .unwrap();
    let params = DtwParams {
        weights: Weights {
            gap_penalty,
            ..Weights::default()
        },
        band_radius: radius,
        band_width_percentage: band_width,
        use_global_band: !matches.is_present("no_global_band"),
        precompute: !matches.is_present("no_precompute"),
        parallelism: threads,
        min_anchor_spacing,
        ..DtwParams::default()
    };
    let tolerance: Option<f64> = matches
        .value_of("time_tolerance")
        .and_then(|e| e.parse().ok());
    let cost = cost_function(matches.value_of("metric").unwrap(), tolerance);
    debug!("Start");
    match align_anchored(&reference, &query, &anchors, cost.as_ref(), &params) {
        Ok(alignment) => {
            let stdout = std::io::stdout();
            let mut wtr = std::io::BufWriter::new(stdout.lock());
            use std::io::Write;
            writeln!(&mut wtr, "# score\t{}", alignment.score)?;
            for (i, j) in alignment.path.iter() {
                writeln!(&mut wtr, "{}\t{}", i, j)?;
            }
            Ok(())
        }
        Err(why) => {
            error!("{}", why);
            std::process::exit(1);
        }
    }
}

fn cost_function(metric: &str, tolerance: Option<f64>) -> Box<dyn CostFunction> {
    match (metric, tolerance) {
        ("euclidean", None) => Box::new(Euclidean),
        ("euclidean", Some(tol)) => Box::new(TimePenalized::new(Euclidean, tol)),
        ("manhattan", None) => Box::new(Manhattan),
        ("manhattan", Some(tol)) => Box::new(TimePenalized::new(Manhattan, tol)),
        ("dot", None) => Box::new(Dot),
        ("dot", Some(tol)) => Box::new(TimePenalized::new(Dot, tol)),
        ("cosine", None) => Box::new(Cosine),
        ("cosine", Some(tol)) => Box::new(TimePenalized::new(Cosine, tol)),
        _ => unreachable!(),
    }
}

fn read_run(path: &str) -> std::io::Result<Run> {
    use std::io::BufRead;
    let rdr = std::io::BufReader::new(std::fs::File::open(path)?);
    let (mut scans, mut times) = (vec![], vec![]);
    for line in rdr.lines() {
        let line = line?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<f64> = line
            .split_whitespace()
            .filter_map(|e| e.parse().ok())
            .collect();
        if fields.is_empty() {
            continue;
        }
        times.push(fields[0]);
        scans.push(fields[1..].to_vec());
    }
    Ok(Run::with_times(scans, times))
}

fn read_anchors(path: &str) -> std::io::Result<Vec<Anchor>> {
    use std::io::BufRead;
    let rdr = std::io::BufReader::new(std::fs::File::open(path)?);
    let mut anchors = vec![];
    for line in rdr.lines() {
        let line = line?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace().filter_map(|e| e.parse().ok());
        if let (Some(row), Some(col)) = (fields.next(), fields.next()) {
            anchors.push(Anchor::new(row, col));
        }
    }
    Ok(anchors)
}
