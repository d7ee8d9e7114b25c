use pdc_ledger::storage::snapshot::{load_or_init, write_snapshot};
use pdc_ledger::{CallerIdentity, Invocation, LedgerConfig, LedgerHandler};
use std::io::Write;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return Err("missing command".into());
    }
    match args[1].as_str() {
        "invoke" => cmd_invoke(&args[2..]),
        "config" => match args.get(2).map(String::as_str) {
            Some("check") => cmd_config_check(&args[3..]),
            Some(other) => Err(format!("unknown config command: {other}")),
            None => Err("missing config subcommand".into()),
        },
        other => {
            print_usage();
            Err(format!("unknown top-level command: {other}"))
        }
    }
}

fn cmd_invoke(args: &[String]) -> Result<(), String> {
    let state_dir = parse_flag_value(args, "--state-dir").ok_or("--state-dir is required")?;
    let msp_id = parse_flag_value(args, "--msp").ok_or("--msp is required")?;
    let function = parse_flag_value(args, "--function").ok_or("--function is required")?;
    let config = load_config(args)?;

    let mut identity = CallerIdentity::new(msp_id);
    for attr in parse_flag_values(args, "--attr") {
        let (name, value) = split_pair(&attr, "--attr")?;
        identity = identity.with_attribute(name, value);
    }

    let mut invocation = Invocation::new(function).with_args(parse_flag_values(args, "--arg"));
    for entry in parse_flag_values(args, "--transient") {
        let (key, value) = split_pair(&entry, "--transient")?;
        invocation = invocation.with_transient(key, value);
    }

    let handler = LedgerHandler::new(config).map_err(|e| e.to_error_json())?;
    let dir = Path::new(&state_dir);
    let store = load_or_init(dir, handler.config()).map_err(|e| e.to_error_json())?;

    let response = handler.invoke(&store, &identity, &invocation);
    if !response.is_ok() {
        return Err(response.message);
    }
    write_snapshot(&store, dir).map_err(|e| e.to_error_json())?;

    let mut stdout = std::io::stdout();
    stdout
        .write_all(&response.payload)
        .and_then(|_| {
            if response.payload.is_empty() {
                Ok(())
            } else {
                stdout.write_all(b"\n")
            }
        })
        .map_err(|e| format!("write output: {e}"))
}

fn cmd_config_check(args: &[String]) -> Result<(), String> {
    let path = parse_flag_value(args, "--config").ok_or("--config is required")?;
    let config = LedgerConfig::load(Path::new(&path)).map_err(|e| e.to_string())?;
    println!(
        "ok\t{}\t{}\t{}\t{}",
        path,
        config.manufacturer_msp,
        config.product_collection,
        config.org_collections.len()
    );
    for route in &config.org_collections {
        println!(
            "route\t{}={}\t{}",
            config.routing_attribute, route.attribute_value, route.collection
        );
    }
    Ok(())
}

fn load_config(args: &[String]) -> Result<LedgerConfig, String> {
    match parse_flag_value(args, "--config") {
        Some(path) => LedgerConfig::load(Path::new(&path)).map_err(|e| e.to_string()),
        None => Ok(LedgerConfig::default()),
    }
}

fn parse_flag_value(args: &[String], flag: &str) -> Option<String> {
    parse_flag_values(args, flag).into_iter().next()
}

/// Every `--name` token consumes the token after it as its value, so a value
/// spelled like a flag is never read as one.
fn parse_flag_values(args: &[String], flag: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut idx = 0;
    while idx < args.len() {
        if !args[idx].starts_with("--") {
            idx += 1;
            continue;
        }
        if args[idx] == flag {
            if let Some(value) = args.get(idx + 1) {
                values.push(value.clone());
            }
        }
        idx += 2;
    }
    values
}

fn split_pair<'a>(entry: &'a str, flag: &str) -> Result<(&'a str, &'a str), String> {
    entry
        .split_once('=')
        .ok_or_else(|| format!("{flag} expects name=value, got: {entry}"))
}

fn print_usage() {
    eprintln!("usage:");
    eprintln!(
        "  pdc invoke --state-dir <dir> --msp <msp-id> --function <name> [--arg <value>]... \
         [--transient <key>=<json>]... [--attr <name>=<value>]... [--config <file>]"
    );
    eprintln!("  pdc config check --config <file>");
}

#[cfg(test)]
mod tests {
    use super::{parse_flag_value, parse_flag_values};

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flag_shaped_value_is_not_a_flag() {
        let args = argv(&["--arg", "--arg", "x"]);
        assert_eq!(parse_flag_values(&args, "--arg"), vec!["--arg".to_string()]);

        let args = argv(&["--msp", "--function", "--function", "readProduct"]);
        assert_eq!(parse_flag_value(&args, "--msp").as_deref(), Some("--function"));
        assert_eq!(
            parse_flag_value(&args, "--function").as_deref(),
            Some("readProduct")
        );
    }

    #[test]
    fn repeated_flags_are_collected_in_order() {
        let args = argv(&[
            "--state-dir",
            "/tmp/s",
            "--transient",
            "product={}",
            "--arg",
            "a",
            "--transient",
            "orgDetails={}",
        ]);
        assert_eq!(
            parse_flag_values(&args, "--transient"),
            vec!["product={}".to_string(), "orgDetails={}".to_string()]
        );
        assert_eq!(parse_flag_values(&args, "--arg"), vec!["a".to_string()]);
        assert_eq!(parse_flag_value(&args, "--config"), None);
    }

    #[test]
    fn trailing_flag_without_value_is_ignored() {
        let args = argv(&["--arg", "a", "--arg"]);
        assert_eq!(parse_flag_values(&args, "--arg"), vec!["a".to_string()]);
    }
}
