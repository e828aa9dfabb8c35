use std::{env, fmt, str::FromStr, time::Duration};

use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    native_token::LAMPORTS_PER_SOL, pubkey, pubkey::Pubkey,
};

use crate::error::{WagerError, WagerResult};

pub const PROGRAM_ID: Pubkey = pubkey!("Dxrbup3i6wCZabtFzAPPqJkcSnvSZBfpFipUZdqWVqhw");
pub const FEE_ACCOUNT: Pubkey = pubkey!("3wZP62kiHGDqFpN8GQ2Xk67UYdpqPsK7WTGGrHydYM9v");
pub const HOUSE_ACCOUNT: Pubkey = pubkey!("HE1XMz6fJUWszf1XMyEPG8c4M6HpjMxyVPUHqp9CDR33");

/// Bytes allocated for every escrow. Larger than the program's layout needs.
pub const ESCROW_SPACE: u64 = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cluster {
    Devnet,
    Testnet,
    MainnetBeta,
    Custom(String),
}

impl Cluster {
    pub fn url(&self) -> &str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Custom(url) => url,
        }
    }

    /// Only mainnet refuses airdrops outright.
    pub fn allows_airdrop(&self) -> bool {
        !matches!(self, Cluster::MainnetBeta)
    }
}

impl FromStr for Cluster {
    type Err = WagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "mainnet-beta" | "mainnet" => Ok(Cluster::MainnetBeta),
            url if url.starts_with("http://") || url.starts_with("https://") => {
                Ok(Cluster::Custom(url.to_string()))
            }
            other => Err(WagerError::Config(format!("unknown cluster `{}`", other))),
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cluster::Devnet => write!(f, "devnet"),
            Cluster::Testnet => write!(f, "testnet"),
            Cluster::MainnetBeta => write!(f, "mainnet-beta"),
            Cluster::Custom(url) => write!(f, "{}", url),
        }
    }
}

/// The two wager sizes offered to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Half,
    One,
}

impl Preset {
    pub fn lamports(self) -> u64 {
        match self {
            Preset::Half => LAMPORTS_PER_SOL / 2,
            Preset::One => LAMPORTS_PER_SOL,
        }
    }
}

/// The three protocol identities every wager references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolAccounts {
    pub program_id: Pubkey,
    pub fee_account: Pubkey,
    pub house_account: Pubkey,
}

impl Default for ProtocolAccounts {
    fn default() -> Self {
        Self {
            program_id: PROGRAM_ID,
            fee_account: FEE_ACCOUNT,
            house_account: HOUSE_ACCOUNT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WagerConfig {
    pub cluster: Cluster,
    pub accounts: ProtocolAccounts,
    pub escrow_space: u64,
    /// Level a wager must reach to count as confirmed
    pub commitment: CommitmentConfig,
    /// Delay between signature status polls
    pub poll_interval: Duration,
    /// Hard ceiling on a confirmation wait, behind the blockhash expiry check
    pub confirm_timeout: Duration,
}

impl Default for WagerConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::Devnet,
            accounts: ProtocolAccounts::default(),
            escrow_space: ESCROW_SPACE,
            commitment: CommitmentConfig::finalized(),
            poll_interval: Duration::from_millis(500),
            confirm_timeout: Duration::from_secs(90),
        }
    }
}

impl WagerConfig {
    /// Defaults overridden by any `COINFLIP_*` variables present in the environment.
    pub fn from_env() -> WagerResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> WagerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(cluster) = lookup("COINFLIP_CLUSTER") {
            config.cluster = cluster.parse()?;
        }
        if let Some(key) = lookup("COINFLIP_PROGRAM_ID") {
            config.accounts.program_id = parse_pubkey("COINFLIP_PROGRAM_ID", &key)?;
        }
        if let Some(key) = lookup("COINFLIP_FEE_ACCOUNT") {
            config.accounts.fee_account = parse_pubkey("COINFLIP_FEE_ACCOUNT", &key)?;
        }
        if let Some(key) = lookup("COINFLIP_HOUSE_ACCOUNT") {
            config.accounts.house_account = parse_pubkey("COINFLIP_HOUSE_ACCOUNT", &key)?;
        }
        if let Some(level) = lookup("COINFLIP_COMMITMENT") {
            let commitment = CommitmentLevel::from_str(&level)
                .map_err(|e| WagerError::Config(format!("COINFLIP_COMMITMENT: {}", e)))?;
            config.commitment = CommitmentConfig { commitment };
        }
        if let Some(ms) = lookup("COINFLIP_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(parse_u64("COINFLIP_POLL_INTERVAL_MS", &ms)?);
        }
        if let Some(secs) = lookup("COINFLIP_CONFIRM_TIMEOUT_SECS") {
            config.confirm_timeout =
                Duration::from_secs(parse_u64("COINFLIP_CONFIRM_TIMEOUT_SECS", &secs)?);
        }

        Ok(config)
    }
}

fn parse_pubkey(name: &str, value: &str) -> WagerResult<Pubkey> {
    Pubkey::from_str(value).map_err(|e| WagerError::Config(format!("{}: {}", name, e)))
}

fn parse_u64(name: &str, value: &str) -> WagerResult<u64> {
    value
        .parse()
        .map_err(|e| WagerError::Config(format!("{}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn presets_are_half_and_one_sol() {
        assert_eq!(Preset::Half.lamports(), 500_000_000);
        assert_eq!(Preset::One.lamports(), 1_000_000_000);
    }

    #[test]
    fn defaults_target_devnet() {
        let config = WagerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.cluster, Cluster::Devnet);
        assert_eq!(config.accounts, ProtocolAccounts::default());
        assert_eq!(config.escrow_space, 1024);
        assert_eq!(config.commitment, CommitmentConfig::finalized());
    }

    #[test]
    fn env_overrides_apply() {
        let house = Pubkey::new_unique();
        let config = WagerConfig::from_lookup(lookup(&[
            ("COINFLIP_CLUSTER", "mainnet-beta"),
            ("COINFLIP_HOUSE_ACCOUNT", house.to_string().as_str()),
            ("COINFLIP_POLL_INTERVAL_MS", "250"),
            ("COINFLIP_COMMITMENT", "confirmed"),
        ]))
        .unwrap();
        assert_eq!(config.cluster, Cluster::MainnetBeta);
        assert!(!config.cluster.allows_airdrop());
        assert_eq!(config.accounts.house_account, house);
        assert_eq!(config.accounts.fee_account, FEE_ACCOUNT);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.commitment, CommitmentConfig::confirmed());
    }

    #[test]
    fn malformed_values_are_config_errors() {
        assert_matches!(
            WagerConfig::from_lookup(lookup(&[("COINFLIP_PROGRAM_ID", "not-a-key")])),
            Err(WagerError::Config(_))
        );
        assert_matches!(
            WagerConfig::from_lookup(lookup(&[("COINFLIP_CLUSTER", "localnet")])),
            Err(WagerError::Config(_))
        );
        assert_matches!(
            WagerConfig::from_lookup(lookup(&[("COINFLIP_COMMITMENT", "rooted-ish")])),
            Err(WagerError::Config(_))
        );
    }

    #[test]
    fn custom_cluster_keeps_url() {
        let cluster: Cluster = "http://127.0.0.1:8899".parse().unwrap();
        assert_eq!(cluster.url(), "http://127.0.0.1:8899");
    }
}
