use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};
use split_escrow_client::Simulation;
use split_escrow_core::params::load_escrow_data;
use split_escrow_core::{AssetRef, EscrowParams, Identity};

const DEFAULT_ESCROW_PARAMS_PATH: &str = "./escrow_params.json";
const DEFAULT_ESCROW_STATE_PATH: &str = "./escrow_state.json";

fn main() -> anyhow::Result<()> {
    // In order to view logs, run with e.g. `RUST_LOG=info`
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut sim = match &cli.command {
        Commands::Create { params } => {
            let params: EscrowParams = load_escrow_data(params)?;
            Simulation::create(&params)?
        }
        _ => Simulation::load(&cli.state)?,
    };

    match cli.command {
        Commands::Create { .. } => {
            tracing::info!(address = %sim.escrow_address(), "Escrow created successfully");
        }
        Commands::Mint { asset, to, amount } => {
            sim.mint(asset.into_ref(), &to, amount)?;
            tracing::info!(%to, amount, "Tokens minted");
        }
        Commands::Deposit {
            asset,
            from,
            amount,
        } => {
            sim.deposit(asset.into_ref(), &from, amount)?;
            tracing::info!(%from, amount, "Tokens deposited into escrow");
        }
        Commands::SetAsset { caller, asset } => {
            sim.set_asset(&caller, asset.into_ref())?;
            tracing::info!("Escrow asset set successfully");
        }
        Commands::Fulfill { caller } => {
            sim.fulfill(&caller)?;
            tracing::info!("Escrow conditions fulfilled");
        }
        Commands::Claim { caller } => {
            let receipt = sim.claim(&caller)?;
            for payout in &receipt.payouts {
                println!("{} <- {}", payout.recipient, payout.amount);
            }
            tracing::info!(
                distributed = receipt.distributed(),
                remainder = receipt.remainder,
                "Escrow claimed successfully"
            );
        }
        Commands::Balance { asset, holder } => {
            let holder = holder.unwrap_or_else(|| sim.escrow_address().clone());
            println!("{}", sim.balance(&asset.into_ref(), &holder));
            return Ok(());
        }
        Commands::Show => {
            println!("phase: {}", sim.phase());
            println!("{}", serde_json::to_string_pretty(&sim)?);
            return Ok(());
        }
    }

    sim.save(&cli.state)?;
    Ok(())
}

#[derive(Parser)]
#[command(name = "split-escrow-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Simulation state file, rewritten after every mutating command.
    #[arg(short, long,
        global = true,
        value_parser,
        default_value = DEFAULT_ESCROW_STATE_PATH,
        value_hint = ValueHint::FilePath)]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct AssetArgs {
    /// Token contract identity (0x-hex or base58).
    #[arg(short, long)]
    asset: Identity,

    /// Optional ticker shown in logs.
    #[arg(long)]
    symbol: Option<String>,
}

impl AssetArgs {
    fn into_ref(self) -> AssetRef {
        let asset = AssetRef::new(self.asset);
        match self.symbol {
            Some(symbol) => asset.with_symbol(symbol),
            None => asset,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a new escrow from a parameters file.
    Create {
        #[arg(short, long,
            value_parser,
            default_value = DEFAULT_ESCROW_PARAMS_PATH,
            value_hint = ValueHint::FilePath)]
        params: PathBuf,
    },
    /// Mint test tokens.
    Mint {
        #[command(flatten)]
        asset: AssetArgs,
        #[arg(long)]
        to: Identity,
        #[arg(long)]
        amount: u128,
    },
    /// Transfer tokens into the escrow.
    Deposit {
        #[command(flatten)]
        asset: AssetArgs,
        #[arg(long)]
        from: Identity,
        #[arg(long)]
        amount: u128,
    },
    /// Select the asset the escrow distributes (owner only).
    SetAsset {
        #[arg(short, long)]
        caller: Identity,
        #[command(flatten)]
        asset: AssetArgs,
    },
    /// Mark the release conditions as met (conditions fulfiller only).
    Fulfill {
        #[arg(short, long)]
        caller: Identity,
    },
    /// Distribute the escrow's current balance.
    Claim {
        #[arg(short, long)]
        caller: Identity,
    },
    /// Print a balance; defaults to the escrow's own.
    Balance {
        #[command(flatten)]
        asset: AssetArgs,
        #[arg(long)]
        holder: Option<Identity>,
    },
    /// Print the escrow phase and full simulation state.
    Show,
}
