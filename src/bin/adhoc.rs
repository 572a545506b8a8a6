use adhoc::logging::{configure_logging, level_from_name};
use adhoc::{
    format_unit, open_stream, parse_arguments, prepare_testdata, AdhocArguments, ArgValue,
    ArgsError, ParseOptions, Scale, Transform, SUBCOMMAND_KEY,
};
use anyhow::{anyhow, Result};
use std::process;
use std::sync::Arc;

const SUBCOMMANDS: &str = "show|head|testdata|unit";

fn main() {
    let argv: Vec<String> = std::env::args().collect();
    let options = ParseOptions::new()
        .subcommands(SUBCOMMANDS)
        .expand_config("config");
    let args = match parse_arguments(&argv, &options) {
        Ok(args) => args,
        Err(ArgsError::MissingSubcommand { program, choices }) => {
            println!("{} requires subcommands: {}", program, choices.join("|"));
            process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            for suggestion in e.suggestions() {
                eprintln!("  {}", suggestion);
            }
            process::exit(1);
        }
    };

    let level = args.get_str("log_level|=warn").unwrap_or_default();
    let json = args.get_bool("log_json|=false").unwrap_or(false);
    configure_logging(level_from_name(&level), json);

    let subcommand = args.get_str(SUBCOMMAND_KEY).unwrap_or_default();
    let result = match subcommand.as_str() {
        "show" => run_show(&args),
        "head" => run_head(&args),
        "testdata" => run_testdata(&args),
        "unit" => run_unit(&args),
        other => Err(anyhow!("unknown subcommand {}", other)),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Print the resolved arguments without consuming them.
fn run_show(args: &Arc<AdhocArguments>) -> Result<()> {
    let store = ArgValue::Map(args.snapshot()).to_json();
    println!("{}", serde_json::to_string_pretty(&store)?);
    Ok(())
}

fn run_head(args: &Arc<AdhocArguments>) -> Result<()> {
    let files = args.files();
    if files.is_empty() {
        args.raise_files(None);
    }
    let n = args.get_usize("head|=5").unwrap_or(5);
    for file in &files {
        // `head` is the sample count here, not a stream bound.
        let stream_args = args.from_kwargs(adhoc::arg_map([("end", n)]));
        let stream = open_stream(file, &stream_args)?;
        let transform = Transform::from_args(&stream_args);
        args.print(&format!("{} ({})", file, stream.datatag()));
        for sample in transform.transform_iter(stream.samples()?) {
            println!("{}", serde_json::to_string(&sample?)?);
        }
    }
    args.check_unused();
    Ok(())
}

fn run_testdata(args: &Arc<AdhocArguments>) -> Result<()> {
    let files = args.files();
    if files.is_empty() {
        args.raise_files(None);
    }
    let tag = args.get_str("tag|=").unwrap_or_default();
    for file in &files {
        let record = prepare_testdata(file, &tag, args)?;
        args.print(&format!("{} samples => {}", record.len(), record.path.display()));
    }
    args.check_unused();
    Ok(())
}

fn run_unit(args: &Arc<AdhocArguments>) -> Result<()> {
    let base = args.get("scale|=1000").and_then(|v| v.as_i64()).unwrap_or(1000);
    let scale = Scale::from_base(base)
        .ok_or_else(|| anyhow!("scale must be 1000, 1024 or 60, got {}", base))?;
    for item in args.files() {
        let num: f64 = item
            .parse()
            .map_err(|_| anyhow!("not a number: {}", item))?;
        println!("{}\t{}", item, format_unit(num, scale));
    }
    args.check_unused();
    Ok(())
}
