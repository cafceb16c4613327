//! # RpcBridge CLI Entry Point
//!
//! Operator tool for inspecting what the bridge sends and persists.
//!
//! ## Usage
//!
//! ```bash
//! # Build an argument payload (prints hex)
//! rpcbridge encode hello world
//! rpcbridge encode --hex cafe 00ff
//!
//! # Inspect a payload
//! rpcbridge decode 000000010000000568656c6c6f
//!
//! # Show the parameter types the bridge would send
//! rpcbridge types '[1, "a", true]'
//! rpcbridge types '["a"]' --hints com.example.Name
//!
//! # Check a service key
//! rpcbridge key grp/com.example.Svc:1.0
//!
//! # List the recovery log
//! rpcbridge log --base-dir /dapr/logs
//! ```
//!
//! All output goes to stdout as JSON or hex. Logs go to stderr.

use anyhow::Result;
use argh::FromArgs;
use rpcbridge_cli::{
    decode_frames, describe_key, encode_frames, list_recovery_log, resolve_json_types,
};
use rpcbridge_client::recovery::{ACTION, DEFAULT_BASE_DIR, PRODUCT};
use std::path::PathBuf;

#[derive(FromArgs)]
/// RpcBridge - inspect frames, types, keys and recovery logs
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Encode(EncodeArgs),
    Decode(DecodeArgs),
    Types(TypesArgs),
    Key(KeyArgs),
    Log(LogArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "encode")]
/// build an argument frame payload
struct EncodeArgs {
    /// treat each argument as hex instead of UTF-8 text
    #[argh(switch)]
    hex: bool,

    /// positional arguments, in call order
    #[argh(positional)]
    args: Vec<String>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "decode")]
/// decode a hex argument frame payload
struct DecodeArgs {
    /// hex encoded payload
    #[argh(positional)]
    payload: String,
}

/// Arguments for type resolution.
///
/// The arguments are a JSON array. Numbers without a fraction are `long`,
/// objects are composites without a class name.
#[derive(FromArgs)]
#[argh(subcommand, name = "types")]
/// show the remote parameter types for JSON arguments
struct TypesArgs {
    /// JSON array of argument values
    #[argh(positional)]
    args: String,

    /// comma-separated parameter type hints
    #[argh(option)]
    hints: Option<String>,

    /// resolve as a generic invocation
    #[argh(switch)]
    generic: bool,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "key")]
/// parse a group/interface:version service key
struct KeyArgs {
    /// the service key
    #[argh(positional)]
    key: String,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "log")]
/// list the services recorded in a recovery log
struct LogArgs {
    /// base directory of recovery logs
    #[argh(option, default = "DEFAULT_BASE_DIR.into()")]
    base_dir: PathBuf,

    /// product scope of the log
    #[argh(option, default = "PRODUCT.to_string()")]
    product: String,

    /// action scope of the log
    #[argh(option, default = "ACTION.to_string()")]
    action: String,
}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // Default to INFO, RUST_LOG overrides. Stdout stays machine-readable.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Encode(args) => {
            println!("{}", encode_frames(&args.args, args.hex)?);
        }
        Commands::Decode(args) => {
            println!("{}", serde_json::to_string_pretty(&decode_frames(&args.payload)?)?);
        }
        Commands::Types(args) => {
            let types = resolve_json_types(&args.args, args.hints.as_deref(), args.generic)?;
            println!("{}", serde_json::to_string(&types)?);
        }
        Commands::Key(args) => {
            println!("{}", serde_json::to_string_pretty(&describe_key(&args.key)?)?);
        }
        Commands::Log(args) => {
            tracing::debug!(base_dir = %args.base_dir.display(), "Reading recovery log");
            let listed = list_recovery_log(&args.base_dir, &args.product, &args.action)?;
            println!("{}", serde_json::to_string_pretty(&listed)?);
        }
    }

    Ok(())
}

/// CLI argument parsing tests.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_encode() {
        let args: Cli = Cli::from_args(&["rpcbridge"], &["encode", "a", "b"]).unwrap();
        match args.command {
            Commands::Encode(EncodeArgs { hex, args }) => {
                assert!(!hex);
                assert_eq!(args, vec!["a".to_string(), "b".to_string()]);
            }
            _ => panic!("Expected Encode command"),
        }
    }

    #[test]
    fn test_cli_parse_encode_hex_no_args() {
        let args: Cli = Cli::from_args(&["rpcbridge"], &["encode", "--hex"]).unwrap();
        match args.command {
            Commands::Encode(EncodeArgs { hex, args }) => {
                assert!(hex);
                assert!(args.is_empty());
            }
            _ => panic!("Expected Encode command"),
        }
    }

    #[test]
    fn test_cli_parse_decode() {
        let args: Cli = Cli::from_args(&["rpcbridge"], &["decode", "00000000"]).unwrap();
        match args.command {
            Commands::Decode(DecodeArgs { payload }) => assert_eq!(payload, "00000000"),
            _ => panic!("Expected Decode command"),
        }
    }

    #[test]
    fn test_cli_parse_types() {
        let args: Cli = Cli::from_args(
            &["rpcbridge"],
            &["types", "[1]", "--hints", "int", "--generic"],
        )
        .unwrap();
        match args.command {
            Commands::Types(TypesArgs {
                args,
                hints,
                generic,
            }) => {
                assert_eq!(args, "[1]");
                assert_eq!(hints, Some("int".to_string()));
                assert!(generic);
            }
            _ => panic!("Expected Types command"),
        }
    }

    #[test]
    fn test_cli_parse_key() {
        let args: Cli = Cli::from_args(&["rpcbridge"], &["key", "g/Svc:1"]).unwrap();
        match args.command {
            Commands::Key(KeyArgs { key }) => assert_eq!(key, "g/Svc:1"),
            _ => panic!("Expected Key command"),
        }
    }

    #[test]
    fn test_cli_parse_log_defaults() {
        let args: Cli = Cli::from_args(&["rpcbridge"], &["log"]).unwrap();
        match args.command {
            Commands::Log(LogArgs {
                base_dir,
                product,
                action,
            }) => {
                assert_eq!(base_dir, PathBuf::from("/dapr/logs"));
                assert_eq!(product, "dapr");
                assert_eq!(action, "dubbo-subscribe");
            }
            _ => panic!("Expected Log command"),
        }
    }

    #[test]
    fn test_cli_parse_log_custom_dir() {
        let args: Cli =
            Cli::from_args(&["rpcbridge"], &["log", "--base-dir", "/tmp/logs"]).unwrap();
        match args.command {
            Commands::Log(LogArgs { base_dir, .. }) => {
                assert_eq!(base_dir, PathBuf::from("/tmp/logs"));
            }
            _ => panic!("Expected Log command"),
        }
    }

    #[test]
    fn test_cli_rejects_missing_subcommand() {
        assert!(Cli::from_args(&["rpcbridge"], &[]).is_err());
    }
}
