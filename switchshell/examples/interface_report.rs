//! Interface report example
//!
//! Connects to a switch, escalates to privileged mode, prints the
//! `show interfaces status` table and optionally exports it as CSV or applies
//! a port action.
//!
//! # Usage
//!
//! Print the status table:
//! ```bash
//! cargo run --example interface_report -- --host 192.168.1.10 --user admin --password secret
//! ```
//!
//! Export to CSV:
//! ```bash
//! cargo run --example interface_report -- --host sw1 --user admin --password secret --csv ports.csv
//! ```
//!
//! Shut two ports and save:
//! ```bash
//! cargo run --example interface_report -- --host sw1 --user admin --password secret \
//!     --action disable --ports Gi1/0/5,Gi1/0/6 --save
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use switchshell::channel::compile_prompt_pattern;
use switchshell::{HostKeyVerification, PortAction, SessionBuilder, Timing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for transaction timing)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    // Reject a bad action before connecting
    let action: Option<PortAction> = args.action.as_deref().map(str::parse).transpose()?;
    if action.is_some() && args.ports.is_empty() {
        eprintln!("Error: --action needs --ports");
        std::process::exit(1);
    }

    let mut builder = SessionBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .connect_timeout(Duration::from_secs(args.timeout))
        .timing(Timing::new(
            Duration::from_millis(args.settle_ms),
            Duration::from_millis(args.window_ms),
        ));

    if args.insecure {
        builder = builder.host_key_verification(HostKeyVerification::Disabled);
    }

    if let Some(password) = &args.password {
        builder = builder.password(password);
    } else if let Some(key_path) = &args.key {
        builder = builder.private_key(key_path);
    } else {
        eprintln!("Error: Must provide either --password or --key");
        std::process::exit(1);
    }

    if let Some(secret) = &args.enable_secret {
        builder = builder.enable_secret(secret);
    }

    // Stop collecting as soon as the prompt comes back
    if let Some(prompt) = &args.prompt {
        builder = builder.prompt(compile_prompt_pattern(prompt)?);
    }

    println!("Connecting to {}:{}...", args.host, args.port);
    let mut session = builder.connect().await?;
    session.prepare().await?;
    println!("Connected!\n");

    let ports = session.interface_status().await?;
    println!(
        "{:<12} {:<20} {:<13} {:<6} {:<7} {:<7} {}",
        "Port", "Name", "Status", "Vlan", "Duplex", "Speed", "Type"
    );
    println!("{}", "-".repeat(80));
    for port in &ports {
        println!(
            "{:<12} {:<20} {:<13} {:<6} {:<7} {:<7} {}",
            port.port, port.name, port.status, port.vlan, port.duplex, port.speed, port.media_type
        );
    }
    let up = ports.iter().filter(|p| p.is_connected()).count();
    println!("\n{} interfaces, {} connected", ports.len(), up);

    if let Some(path) = &args.csv {
        switchshell::export::export_csv(path, &ports)?;
        println!("Exported to {}", path.display());
    }

    if let Some(action) = &action {
        let targets: Vec<&str> = args.ports.iter().map(String::as_str).collect();
        println!("\nApplying {:?} to {}", action, targets.join(", "));

        let outputs = session.apply(&targets, action).await?;
        for output in outputs.iter().filter(|o| o.contains("% ")) {
            eprintln!("Switch said: {}", output.text.trim());
        }
    }

    if args.save {
        println!("\nSaving configuration...");
        let output = session.save().await?;
        println!("{}", output.text.trim());
    }

    println!("\nClosing connection...");
    session.close().await?;
    println!("Done!");

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    enable_secret: Option<String>,
    timeout: u64,
    settle_ms: u64,
    window_ms: u64,
    prompt: Option<String>,
    csv: Option<PathBuf>,
    action: Option<String>,
    ports: Vec<String>,
    save: bool,
    insecure: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Self {
            host: "192.168.1.1".to_string(),
            port: 22,
            user: env::var("USER").unwrap_or_else(|_| "admin".to_string()),
            password: None,
            key: None,
            enable_secret: None,
            timeout: 30,
            settle_ms: 500,
            window_ms: 1000,
            prompt: None,
            csv: None,
            action: None,
            ports: Vec::new(),
            save: false,
            insecure: false,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--host" | "-h" => parsed.host = value.unwrap_or(parsed.host),
                "--port" | "-p" => {
                    parsed.port = value.and_then(|v| v.parse().ok()).unwrap_or(22)
                }
                "--user" | "-u" => parsed.user = value.unwrap_or(parsed.user),
                "--password" | "-P" => parsed.password = value,
                "--key" | "-k" => parsed.key = value.map(PathBuf::from),
                "--enable-secret" | "-e" => parsed.enable_secret = value,
                "--timeout" | "-t" => {
                    parsed.timeout = value.and_then(|v| v.parse().ok()).unwrap_or(30)
                }
                "--settle-ms" => {
                    parsed.settle_ms = value.and_then(|v| v.parse().ok()).unwrap_or(500)
                }
                "--window-ms" => {
                    parsed.window_ms = value.and_then(|v| v.parse().ok()).unwrap_or(1000)
                }
                "--prompt" => parsed.prompt = value,
                "--csv" => parsed.csv = value.map(PathBuf::from),
                "--action" => parsed.action = value,
                "--ports" => {
                    parsed.ports = value
                        .map(|v| v.split(',').map(|p| p.trim().to_string()).collect())
                        .unwrap_or_default()
                }
                "--save" => {
                    parsed.save = true;
                    i += 1;
                    continue;
                }
                "--insecure" => {
                    parsed.insecure = true;
                    i += 1;
                    continue;
                }
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {}", other);
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }

        parsed
    }

    fn print_help() {
        println!(
            r#"switchshell interface_report example

USAGE:
    cargo run --example interface_report -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>            Switch address [default: 192.168.1.1]
    -p, --port <PORT>            SSH port [default: 22]
    -u, --user <USER>            Username [default: $USER]
    -P, --password <PASS>        Password for authentication
    -k, --key <PATH>             Path to SSH private key
    -e, --enable-secret <PASS>   Secret for the enable prompt
    -t, --timeout <SECS>         Connect timeout [default: 30]
    --settle-ms <MS>             Wait after each command [default: 500]
    --window-ms <MS>             Collection window per command [default: 1000]
    --prompt <REGEX>             End each command early when this prompt appears
    --csv <PATH>                 Export the status table as CSV
    --action <ACTION>            enable | disable | poe-on | poe-off | "describe <text>"
    --ports <LIST>               Comma-separated ports for --action
    --save                       Run `write memory` afterwards
    --insecure                   Skip host key verification (lab use)
    --help                       Print this help message
"#
        );
    }
}
