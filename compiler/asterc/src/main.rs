//! Aster CLI.
//!
//! Thin wrapper over the library pipeline. Exit codes: 0 on success, 1 when
//! any error diagnostic was produced, 2 on usage errors.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use aster_diagnostic::emitter;
use aster_lexicon::Lexicon;
use asterc::{compile, registry, CapabilityManifest, CompileOptions, EffectConfigCache, EffectTable};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return ExitCode::from(2);
    }

    match args[1].as_str() {
        "emit-core" => run_emit_core(&args[2..]),
        "check" => run_check(&args[2..]),
        "tokens" => run_tokens(&args[2..]),
        "canon" => run_canon(&args[2..]),
        "manifest" => run_manifest(&args[2..]),
        _ => {
            print_usage();
            ExitCode::from(2)
        }
    }
}

fn print_usage() {
    eprintln!("Usage: aster <command> [options] <file>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  emit-core <file>   Compile and print pruned Core IR JSON");
    eprintln!("  check <file>       Compile and report diagnostics");
    eprintln!("  tokens <file>      Print the token stream");
    eprintln!("  canon <file>       Print the canonicalized source");
    eprintln!("  manifest <file>    Validate a package manifest");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --locale=<id>      Source locale (default: en)");
    eprintln!("  --manifest=<path>  Capability manifest JSON");
    eprintln!("  --effects=<path>   Effect signature config JSON");
    eprintln!("  --strict-pii       Treat PII findings as errors");
    eprintln!("  --json             Emit diagnostics as JSON lines");
}

struct CommonArgs {
    file: String,
    lexicon: Arc<Lexicon>,
    manifest: Option<CapabilityManifest>,
    effect_table: Option<EffectTable>,
    strict_pii: bool,
    json: bool,
}

fn parse_args(args: &[String]) -> Result<CommonArgs, String> {
    let mut file = None;
    let mut locale = "en".to_string();
    let mut manifest = None;
    let mut effect_table = None;
    let mut strict_pii = false;
    let mut json = false;

    for arg in args {
        if let Some(id) = arg.strip_prefix("--locale=") {
            locale = id.to_string();
        } else if let Some(path) = arg.strip_prefix("--manifest=") {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read manifest {path}: {e}"))?;
            manifest = Some(
                CapabilityManifest::from_json(&text)
                    .map_err(|e| format!("invalid capability manifest {path}: {e}"))?,
            );
        } else if let Some(path) = arg.strip_prefix("--effects=") {
            let mut cache = EffectConfigCache::new();
            effect_table = Some(cache.table_for(Path::new(path)));
        } else if arg == "--strict-pii" {
            strict_pii = true;
        } else if arg == "--json" {
            json = true;
        } else if !arg.starts_with('-') && file.is_none() {
            file = Some(arg.clone());
        } else {
            return Err(format!("unknown option `{arg}`"));
        }
    }

    let file = file.ok_or_else(|| "missing input file".to_string())?;
    let lexicon =
        registry::get(&locale).ok_or_else(|| format!("unknown locale `{locale}`"))?;
    Ok(CommonArgs { file, lexicon, manifest, effect_table, strict_pii, json })
}

fn read_source(file: &str) -> Result<String, String> {
    std::fs::read_to_string(file).map_err(|e| format!("cannot read {file}: {e}"))
}

fn report(args: &CommonArgs, diagnostics: &[aster_diagnostic::Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    if args.json {
        eprint!("{}", emitter::emit_json(diagnostics));
    } else {
        eprint!("{}", emitter::emit_human(&args.file, diagnostics));
    }
}

fn run_emit_core(raw: &[String]) -> ExitCode {
    let args = match parse_args(raw) {
        Ok(args) => args,
        Err(message) => return usage_error(&message),
    };
    let source = match read_source(&args.file) {
        Ok(source) => source,
        Err(message) => return usage_error(&message),
    };

    let mut options = CompileOptions::new(Arc::clone(&args.lexicon), args.file.clone())
        .with_strict_pii(args.strict_pii);
    if let Some(manifest) = args.manifest.clone() {
        options = options.with_manifest(manifest);
    }
    if let Some(table) = args.effect_table.clone() {
        options = options.with_effect_table(table);
    }
    let output = compile(&source, &options);
    report(&args, &output.diagnostics);

    match (&output.core, output.is_clean()) {
        (Some(core), true) => {
            println!("{}", asterc::pruned_value(core));
            ExitCode::SUCCESS
        }
        _ => ExitCode::from(1),
    }
}

fn run_check(raw: &[String]) -> ExitCode {
    let args = match parse_args(raw) {
        Ok(args) => args,
        Err(message) => return usage_error(&message),
    };
    let source = match read_source(&args.file) {
        Ok(source) => source,
        Err(message) => return usage_error(&message),
    };

    let mut options = CompileOptions::new(Arc::clone(&args.lexicon), args.file.clone())
        .with_strict_pii(args.strict_pii);
    if let Some(manifest) = args.manifest.clone() {
        options = options.with_manifest(manifest);
    }
    if let Some(table) = args.effect_table.clone() {
        options = options.with_effect_table(table);
    }
    let output = compile(&source, &options);
    report(&args, &output.diagnostics);

    if output.is_clean() {
        println!("{}: ok", args.file);
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn run_tokens(raw: &[String]) -> ExitCode {
    let args = match parse_args(raw) {
        Ok(args) => args,
        Err(message) => return usage_error(&message),
    };
    let source = match read_source(&args.file) {
        Ok(source) => source,
        Err(message) => return usage_error(&message),
    };

    let canonical = asterc::canonicalize(&source, &args.lexicon);
    match asterc::lex(&canonical, &args.lexicon) {
        Ok(tokens) => {
            for token in &tokens {
                println!("{token:?}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&args, &[err.to_diagnostic()]);
            ExitCode::from(1)
        }
    }
}

fn run_canon(raw: &[String]) -> ExitCode {
    let args = match parse_args(raw) {
        Ok(args) => args,
        Err(message) => return usage_error(&message),
    };
    match read_source(&args.file) {
        Ok(source) => {
            print!("{}", asterc::canonicalize(&source, &args.lexicon));
            ExitCode::SUCCESS
        }
        Err(message) => usage_error(&message),
    }
}

fn run_manifest(raw: &[String]) -> ExitCode {
    let args = match parse_args(raw) {
        Ok(args) => args,
        Err(message) => return usage_error(&message),
    };
    match asterc::parse_manifest(Path::new(&args.file)) {
        Ok(manifest) => {
            println!("{}: ok ({})", args.file, manifest.name.as_deref().unwrap_or("unnamed"));
            ExitCode::SUCCESS
        }
        Err(diags) => {
            report(&args, &diags);
            ExitCode::from(1)
        }
    }
}

fn usage_error(message: &str) -> ExitCode {
    eprintln!("error: {message}");
    print_usage();
    ExitCode::from(2)
}
