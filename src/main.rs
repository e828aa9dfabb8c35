use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use solana_sdk::native_token::{lamports_to_sol, LAMPORTS_PER_SOL};

use coinflip_wager::{
    Cluster, ConfirmationState, KeypairWallet, Preset, Side, WagerConfig, WagerError, WagerSession,
};

#[derive(Parser, Debug)]
#[command(name = "coinflip", version, about = "Place coin-flip wagers on Solana")]
struct Args {
    /// Path to the wallet keypair (JSON)
    #[arg(long)]
    keypair: PathBuf,

    /// devnet|testnet|mainnet-beta or an RPC URL; overrides COINFLIP_CLUSTER
    #[arg(long)]
    cluster: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Place a wager
    Bet {
        /// heads or tails
        #[arg(long)]
        side: Side,

        #[arg(long, value_enum, default_value_t = Amount::Half)]
        amount: Amount,
    },
    /// Request test SOL (devnet/testnet only)
    Airdrop {
        #[arg(long, default_value_t = 3 * LAMPORTS_PER_SOL / 2)]
        lamports: u64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Amount {
    /// 0.5 SOL
    Half,
    /// 1 SOL
    One,
}

impl From<Amount> for Preset {
    fn from(amount: Amount) -> Self {
        match amount {
            Amount::Half => Preset::Half,
            Amount::One => Preset::One,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    solana_logger::setup_with_default("coinflip_wager=info");
    let args = Args::parse();

    let mut config = WagerConfig::from_env()?;
    if let Some(cluster) = args.cluster.as_deref() {
        config.cluster = cluster.parse::<Cluster>()?;
    }

    let wallet = KeypairWallet::from_file(&args.keypair)
        .with_context(|| format!("loading wallet {}", args.keypair.display()))?;
    let mut session = WagerSession::for_cluster(config);
    session.connect(Arc::new(wallet));

    match args.command {
        Command::Bet { side, amount } => {
            let preset = Preset::from(amount);
            println!("Betting {} SOL on {}", lamports_to_sol(preset.lamports()), side);
            let pending = match session.send_preset(side, preset).await {
                Ok(pending) => pending,
                Err(e @ WagerError::Signing(_)) => {
                    println!("> Cancelled, nothing was sent: {}", e);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            println!("> Transaction Signature: {}", pending.signature);
            println!("> Escrow: {}", pending.escrow);

            match session.confirm_wager(&pending).await {
                ConfirmationState::Expired => {
                    println!("> Outcome unknown: check the signature on an explorer before retrying")
                }
                state => println!("> {}", state),
            }
        }
        Command::Airdrop { lamports } => {
            let signature = session.airdrop(lamports).await?;
            println!("> Airdrop Transaction Signature: {}", signature);
        }
    }

    Ok(())
}
