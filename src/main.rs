use std::env;
use std::path::PathBuf;
use std::process::exit;

use ckb_logger::debug;
use clap::{Args, Parser, Subcommand};

use crowdfunding_contracts::Verifier;
use crowdfunding_since::Since;
use crowdfunding_utils::{Config, MockTransaction};

#[derive(Parser)]
#[clap(
    name = "ckb_crowdfunding",
    about = "Verifies crowdfunding transactions against the project, contribution and claim scripts"
)]
/// command line structure for clap parsed
pub struct CrowdfundingCli {
    #[clap(subcommand)]
    pub sub_command: CrowdfundingSubCommand,
}

#[derive(Subcommand)]
#[clap()]
pub enum CrowdfundingSubCommand {
    #[clap(about = "Runs every crowdfunding script group of a mock transaction")]
    Verify(CmdVerify),
    #[clap(about = "Decodes a since value")]
    Since(CmdSince),
}

#[derive(Args)]
#[clap()]
pub struct CmdVerify {
    #[clap(short, long)]
    /// Mock transaction in JSON, with every input and cell dep resolved
    tx: PathBuf,

    #[clap(short, long, default_value = "crowdfunding.toml")]
    /// Script identities per network
    config: PathBuf,

    #[clap(short, long, default_value = "devnet")]
    /// Network section of the config to use
    network: String,
}

#[derive(Args)]
#[clap()]
pub struct CmdSince {
    /// `0x` prefixed hex or decimal
    value: String,
}

fn main() {
    let _logger = init_logger();
    let cli = CrowdfundingCli::parse();

    match &cli.sub_command {
        CrowdfundingSubCommand::Verify(matches) => cmd_verify(matches),
        CrowdfundingSubCommand::Since(matches) => cmd_since(matches),
    }
}

fn cmd_verify(matches: &CmdVerify) {
    let config = Config::load(&matches.config).unwrap_or_else(|err| {
        eprintln!("{}", err);
        exit(-1)
    });
    let network = config.network(&matches.network).unwrap_or_else(|err| {
        eprintln!("{}", err);
        exit(-1)
    });
    let mock = MockTransaction::load(&matches.tx).unwrap_or_else(|err| {
        eprintln!("{}", err);
        exit(-1)
    });
    debug!(
        "verify {} on {}, {} inputs, {} outputs",
        mock.tx.hash(),
        matches.network,
        mock.inputs.len(),
        mock.tx.outputs().len()
    );

    match Verifier::new(network).verify(&mock) {
        Ok(()) => println!("accept"),
        Err(err) => {
            eprintln!("reject: {}", err);
            exit(i32::from(err.error.exit_code()))
        }
    }
}

fn parse_since(value: &str) -> Option<u64> {
    match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

fn cmd_since(matches: &CmdSince) {
    let since = match parse_since(&matches.value) {
        Some(raw) => Since::new(raw),
        None => {
            eprintln!("cannot parse since value `{}`", matches.value);
            exit(-1);
        }
    };
    println!("{:#018x}", since.as_u64());
    println!("{}", since);
}

fn init_logger() -> ckb_logger_service::LoggerInitGuard {
    let filter = match env::var("RUST_LOG") {
        Ok(filter) if filter.is_empty() => Some("info".to_string()),
        Ok(filter) => Some(filter),
        Err(_) => Some("info".to_string()),
    };
    let config = ckb_logger_config::Config {
        filter,
        color: false,
        log_to_file: false,
        log_to_stdout: true,
        ..Default::default()
    };
    ckb_logger_service::init(None, config)
        .unwrap_or_else(|err| panic!("failed to init the logger service, error: {}", err))
}
