//! Demo CLI for waylay.
//!
//! Runs two small scenarios against the object model:
//!
//! - `greet`: hooks a class method and uppercases its result.
//! - `ping`: hooks an object method and counts its calls.
//!
//! Set `RUST_LOG=waylay=trace` (or pass `-vv`) to see every hooked call.

use std::cell::Cell;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use waylay::{Class, HookOperations, HookRegistry, Object, Value};

#[derive(Parser)]
#[command(name = "waylay-demo")]
#[command(about = "Hook methods at runtime and watch the callbacks run")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hook Greeter.greet and uppercase its result
    Greet {
        /// Name to greet
        name: String,

        /// Skip the uppercase hook
        #[arg(long)]
        plain: bool,

        /// Uninstall the hook and greet again
        #[arg(long)]
        restore: bool,
    },

    /// Hook an object's ping method and count calls
    Ping {
        /// Number of calls to make
        #[arg(short, long, default_value = "3")]
        times: u32,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "waylay=info",
        1 => "waylay=debug",
        _ => "waylay=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn greeter() -> Rc<Class> {
    Class::builder("Greeter")
        .method("greet", |_this, args| {
            let name = args.first().and_then(Value::as_str).unwrap_or("");
            Value::from(format!("hi {}", name))
        })
        .build()
}

fn run_greet(name: &str, plain: bool, restore: bool) -> Result<serde_json::Value> {
    let class = greeter();
    let obj = Class::instantiate(&class);
    let mut hooks = HookRegistry::new(&class);

    let operations = if plain {
        HookOperations::new()
    } else {
        HookOperations::new().after(|_this, _args, result| {
            Value::from(result.as_str().unwrap_or_default().to_uppercase())
        })
    };
    hooks
        .install_hook("greet", operations)
        .context("failed to hook Greeter.greet")?;

    let hooked = obj.call("greet", &[name.into()])?;
    let mut report = json!({ "hooked": hooked.to_json() });

    if restore {
        hooks.uninstall_hook("greet")?;
        let restored = obj.call("greet", &[name.into()])?;
        report["restored"] = restored.to_json();
    }

    Ok(report)
}

fn run_ping(times: u32) -> Result<serde_json::Value> {
    let obj = Object::builder()
        .method("ping", |_this, _args| Value::from(1))
        .build();
    let original = obj
        .own()
        .get("ping")
        .context("ping is defined above")?
        .method()
        .clone();

    let calls = Rc::new(Cell::new(0u32));
    let counter = calls.clone();
    let mut hooks = HookRegistry::new(&obj);
    hooks.install_hook(
        "ping",
        HookOperations::new().before(move |_this, _args| counter.set(counter.get() + 1)),
    )?;

    let mut results = Vec::new();
    for _ in 0..times {
        results.push(obj.call("ping", &[])?.to_json());
    }

    let same_original = hooks
        .get_method_instance("ping")
        .map(|m| m.ptr_eq(&original))
        .unwrap_or(false);

    hooks.uninstall_all()?;

    Ok(json!({
        "results": results,
        "calls": calls.get(),
        "original_saved": same_original,
    }))
}

fn print_report(report: &serde_json::Value, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    if let Some(map) = report.as_object() {
        for (key, value) in map {
            match value {
                serde_json::Value::String(s) => println!("{}: {}", key, s),
                other => println!("{}: {}", key, other),
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let report = match cli.command {
        Commands::Greet {
            name,
            plain,
            restore,
        } => run_greet(&name, plain, restore)?,
        Commands::Ping { times } => run_ping(times)?,
    };

    tracing::info!("demo finished");
    print_report(&report, cli.json)
}
