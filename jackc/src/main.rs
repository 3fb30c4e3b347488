use clap::Parser as ClapParser;
use parking_lot::Mutex;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process, thread,
};

use jackc::{CompileOptions, compile_to_vm, compile_to_xml};
use tokenizer::{Lexer, write_token_xml};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Jack source files, one class each
    #[arg(required = true, help = "The .jack files to compile")]
    files: Vec<PathBuf>,

    /// Write `<stem>.vm` for each input into this directory
    #[arg(long, help = "Output directory (default: print to stdout)")]
    out_dir: Option<PathBuf>,

    /// Print the token stream as XML instead of compiling
    #[arg(long, help = "Dump the token listing for inputs")]
    tokens: bool,

    /// Print the parse tree as XML instead of VM code
    #[arg(long, conflicts_with = "tokens", help = "Dump the parse tree for inputs")]
    xml: bool,

    /// Compile but write nothing
    #[arg(long, conflicts_with_all = ["tokens", "xml"], help = "Only report errors")]
    check: bool,

    /// Largest accepted integer constant
    #[arg(long, value_name = "N", help = "Integer constant limit")]
    max_int: Option<u16>,

    /// More log output; repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// What gets produced for each input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Vm,
    Tokens,
    Tree,
}

impl Output {
    /// File name written for `stem` under `--out-dir`.
    fn file_name(self, stem: &str) -> String {
        match self {
            Output::Vm => format!("{stem}.vm"),
            Output::Tokens => format!("{stem}T.xml"),
            Output::Tree => format!("{stem}.xml"),
        }
    }
}

/// What one input produced.
struct Outcome {
    path: PathBuf,
    result: Result<String, String>,
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let mut options = CompileOptions::default();
    if let Some(max) = cli.max_int {
        options.max_int_constant = max;
    }

    let output = if cli.tokens {
        Output::Tokens
    } else if cli.xml {
        Output::Tree
    } else {
        Output::Vm
    };

    let outcomes: Mutex<Vec<(usize, Outcome)>> =
        Mutex::new(Vec::with_capacity(cli.files.len()));
    thread::scope(|scope| {
        for (i, path) in cli.files.iter().enumerate() {
            let options = &options;
            let outcomes = &outcomes;
            scope.spawn(move || {
                let result = process_file(path, options, output);
                outcomes.lock().push((
                    i,
                    Outcome {
                        path: path.clone(),
                        result,
                    },
                ));
            });
        }
    });

    let mut outcomes = outcomes.into_inner();
    outcomes.sort_by_key(|(i, _)| *i);

    let mut failed = false;
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    for (_, outcome) in outcomes {
        match outcome.result {
            Ok(text) => {
                if cli.check {
                    log::info!("{}: ok", outcome.path.display());
                    continue;
                }
                let written = emit(
                    &outcome.path,
                    &text,
                    cli.out_dir.as_deref(),
                    output,
                    &mut stdout,
                );
                if let Err(err) = written {
                    eprintln!(
                        "Error writing output for '{}': {}",
                        outcome.path.display(),
                        err
                    );
                    failed = true;
                }
            }
            Err(message) => {
                eprintln!("{}: {}", outcome.path.display(), message);
                failed = true;
            }
        }
    }

    if failed {
        process::exit(1);
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    // RUST_LOG, when present, overrides the flag.
    builder.parse_default_env();
    builder.init();
}

/// Read and translate one file. Errors come back already rendered.
fn process_file(path: &Path, options: &CompileOptions, output: Output) -> Result<String, String> {
    let source = fs::read_to_string(path).map_err(|err| format!("cannot read file: {err}"))?;
    let compiled = match output {
        Output::Tokens => {
            return write_token_xml(Lexer::from_str(&source)).map_err(|err| err.to_string());
        }
        Output::Tree => compile_to_xml(&source, options),
        Output::Vm => compile_to_vm(&source, options),
    };
    compiled.map_err(|err| {
        log::debug!("{} failed: {err}", path.display());
        err.render(&source)
    })
}

fn emit(
    path: &Path,
    output: &str,
    out_dir: Option<&Path>,
    kind: Output,
    stdout: &mut impl Write,
) -> io::Result<()> {
    match out_dir {
        Some(dir) => {
            let stem = path.file_stem().unwrap_or(path.as_os_str());
            let target = dir.join(kind.file_name(&stem.to_string_lossy()));
            fs::create_dir_all(dir)?;
            fs::write(&target, output)?;
            log::info!("wrote {}", target.display());
            Ok(())
        }
        None => {
            if kind == Output::Vm {
                writeln!(stdout, "// {}", path.display())?;
            }
            stdout.write_all(output.as_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_keep_dotted_stems() {
        assert_eq!(Output::Vm.file_name("My.Class"), "My.Class.vm");
        assert_eq!(Output::Tree.file_name("My.Class"), "My.Class.xml");
        assert_eq!(Output::Tokens.file_name("Main"), "MainT.xml");
    }

    #[test]
    fn emit_writes_next_to_stem() {
        let dir = std::env::temp_dir().join(format!("jackc-emit-{}", process::id()));
        let mut sink = Vec::new();
        emit(
            Path::new("src/My.Class.jack"),
            "return\n",
            Some(dir.as_path()),
            Output::Vm,
            &mut sink,
        )
        .unwrap();
        let written = fs::read_to_string(dir.join("My.Class.vm")).unwrap();
        assert_eq!(written, "return\n");
        assert!(sink.is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn cli_rejects_conflicting_modes() {
        assert!(Cli::try_parse_from(["jackc", "--tokens", "--xml", "A.jack"]).is_err());
        let cli = Cli::try_parse_from(["jackc", "--xml", "-vv", "A.jack"]).unwrap();
        assert!(cli.xml);
        assert_eq!(cli.verbose, 2);
    }
}
