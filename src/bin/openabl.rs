//! Command-line entry point.
//!
//! Flag set mirrors the original compiler's hand-rolled parser
//! (`-i`/`--input`, `-o`/`--output-dir`, `-b`/`--backend`, `-A`/`--asset-dir`,
//! `-h`/`--help`), plus SPEC_FULL additions: `-p name=value` const
//! overrides, `--dump-ast <path>`, and `--pretty-errors`.

use openabl::backend::BackendKind;
use openabl::error::ErrorReporter;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

struct Options {
    help: bool,
    input: Option<String>,
    output_dir: Option<String>,
    backend: String,
    asset_dir: String,
    param_overrides: HashMap<String, String>,
    dump_ast: Option<String>,
    pretty_errors: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            help: false,
            input: None,
            output_dir: None,
            backend: "c".to_string(),
            asset_dir: "./asset".to_string(),
            param_overrides: HashMap::new(),
            dump_ast: None,
            pretty_errors: false,
        }
    }
}

fn parse_cli_options(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if arg == "-h" || arg == "--help" {
            options.help = true;
            return Ok(options);
        }
        if arg == "--pretty-errors" {
            options.pretty_errors = true;
            i += 1;
            continue;
        }

        let Some(value) = args.get(i + 1) else {
            return Err(format!("Missing argument for option \"{}\"", arg));
        };
        match arg.as_str() {
            "-b" | "--backend" => options.backend = value.clone(),
            "-i" | "--input" => options.input = Some(value.clone()),
            "-o" | "--output-dir" => options.output_dir = Some(value.clone()),
            "-A" | "--asset-dir" => options.asset_dir = value.clone(),
            "--dump-ast" => options.dump_ast = Some(value.clone()),
            "-p" => {
                let (name, val) = value
                    .split_once('=')
                    .ok_or_else(|| format!("Invalid -p argument \"{}\", expected name=value", value))?;
                options.param_overrides.insert(name.to_string(), val.to_string());
            }
            other => return Err(format!("Unknown option \"{}\"", other)),
        }
        i += 2;
    }

    if options.input.is_none() {
        return Err("Missing input file (-i or --input)".to_string());
    }
    if options.output_dir.is_none() {
        return Err("Missing output directory (-o or --output-dir)".to_string());
    }
    Ok(options)
}

fn print_help() {
    println!(
        "Usage: openabl -i input.abl -o ./output-dir\n\n\
         Options:\n\
         \x20 -A, --asset-dir    Asset directory (default: ./asset)\n\
         \x20 -b, --backend      Backend: c, flame, mason (default: c)\n\
         \x20 -h, --help         Display this help\n\
         \x20 -i, --input        Input file\n\
         \x20 -o, --output-dir   Output directory\n\
         \x20 -p name=value      Override a const's value\n\
         \x20     --dump-ast     Write the analyzed AST as JSON to the given path\n\
         \x20     --pretty-errors  Render errors with source snippets"
    );
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_cli_options(&args)?;

    if options.help {
        print_help();
        return Ok(());
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("openabl=info")).init();

    let input = options.input.clone().unwrap();
    let source = std::fs::read_to_string(&input)
        .map_err(|_| format!("File \"{}\" could not be opened.", input))?;

    let backend = BackendKind::parse(&options.backend)
        .ok_or_else(|| format!("Unknown backend \"{}\"", options.backend))?;

    let asset_dir = PathBuf::from(&options.asset_dir);
    if !asset_dir.is_dir() {
        return Err(format!(
            "Asset directory \"{}\" does not exist (override with -A or --asset-dir)",
            options.asset_dir
        ));
    }

    log::debug!("parsing {}", input);
    let script = match openabl::analyze_source(&source, options.param_overrides.clone()) {
        Ok(script) => script,
        Err(errors) => {
            report_errors(&input, &source, &errors, options.pretty_errors);
            return Err(String::new());
        }
    };

    if let Some(dump_path) = &options.dump_ast {
        let json = openabl::serializer::to_json_pretty(&script)
            .map_err(|e| format!("Failed to serialize AST: {}", e))?;
        std::fs::write(dump_path, json).map_err(|e| format!("Failed to write \"{}\": {}", dump_path, e))?;
    }

    let output_dir = PathBuf::from(options.output_dir.clone().unwrap());
    log::debug!("generating {} backend into {:?}", options.backend, output_dir);
    openabl::backend::generate(backend, &script, &output_dir, &asset_dir)
        .map_err(|e| e.render(&source))?;

    Ok(())
}

fn report_errors(filename: &str, source: &str, errors: &[openabl::error::OpenABLError], pretty: bool) {
    if pretty {
        let reporter = ErrorReporter::new(filename, source);
        for err in errors {
            eprintln!("{}", reporter.report(err));
        }
    } else {
        for err in errors {
            eprintln!("{}", err.render(source));
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("{}", message);
            }
            ExitCode::FAILURE
        }
    }
}
