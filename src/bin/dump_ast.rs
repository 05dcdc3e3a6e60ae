//! Thin debug utility: parse (optionally analyze) a source file and print
//! its AST as JSON. Mirrors the teacher's `parse_to_json` bin, retargeted
//! at OpenABL's own AST.

use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let analyze = args.iter().any(|a| a == "--analyze");
    let path = match args.iter().find(|a| !a.starts_with("--")) {
        Some(p) => p,
        None => {
            eprintln!("Usage: openabl-dump-ast [--analyze] <file.abl>");
            return ExitCode::FAILURE;
        }
    };

    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read \"{}\": {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let result = if analyze {
        openabl::analyze_source(&source, Default::default())
    } else {
        openabl::parser::parse(&source).map_err(|e| vec![e])
    };

    match result {
        Ok(script) => match openabl::serializer::to_json_pretty(&script) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to serialize AST: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(errors) => {
            for err in &errors {
                eprintln!("{}", err.render(&source));
            }
            ExitCode::FAILURE
        }
    }
}
