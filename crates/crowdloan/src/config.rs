use crate::{
    error::CrowdloanError,
    fetch::{FetchOptions, FileFormat, DEFAULT_KEY_PAGE_SIZE},
    rewards::RewardPolicy,
};
use crowdloan_primitives::{
    parachain_sovereign_account, AccountId32, Ss58Normalizer, BIFROST_PREFIX, POLKADOT_PREFIX,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default relay chain RPC endpoint.
pub const DEFAULT_ENDPOINT: &str = "wss://rpc.polkadot.io";

/// Parachain whose crowdloan is reconciled.
pub const DEFAULT_PARA_ID: u32 = 3370;

/// Parachain whose sovereign account contributed on behalf of the file contributors.
pub const DEFAULT_AGGREGATOR_PARA_ID: u32 = 2030;

/// Default off-chain contributor file.
pub const DEFAULT_CONTRIBUTORS_FILE: &str = "bifrost_contributors";

/// Where the aggregate contribution comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatorConfig {
    /// An explicit SS58 address, in the canonical format.
    Address(String),
    /// The sovereign account of a parachain.
    Sovereign(u32),
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::Sovereign(DEFAULT_AGGREGATOR_PARA_ID)
    }
}

impl AggregatorConfig {
    /// Resolves the aggregator account.
    pub fn account(&self, normalizer: &Ss58Normalizer) -> Result<AccountId32, CrowdloanError> {
        match self {
            Self::Address(address) => {
                Ok(normalizer.decode(address, normalizer.canonical_prefix())?)
            }
            Self::Sovereign(para_id) => Ok(parachain_sovereign_account(*para_id)),
        }
    }
}

/// Settings of a reconciliation run.
///
/// Every field has a default except the closure block height, which is chain
/// specific and must be supplied by the TOML file or the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CrowdloanConfig {
    /// Relay chain JSON-RPC endpoint.
    pub endpoint: String,
    /// Parachain whose crowdloan fund is read.
    pub para_id: u32,
    /// Relay chain block height the crowdloan closed at.
    pub block_number: Option<u32>,
    /// SS58 prefix every output address is rendered with.
    pub canonical_prefix: u16,
    /// Off-chain `address,amount` file.
    pub contributors_file: PathBuf,
    /// SS58 prefix of the addresses in the contributor file.
    pub contributors_prefix: u16,
    /// Account whose on-chain entry is replaced by the file records.
    pub aggregator: AggregatorConfig,
    /// Directory the reports are written to.
    pub output_dir: PathBuf,
    /// Conversion from contributions to rewards.
    pub rewards: RewardPolicy,
    /// Child keys requested per page.
    pub key_page_size: u32,
    /// Contribution reads in flight.
    pub fetch_concurrency: usize,
}

impl Default for CrowdloanConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            para_id: DEFAULT_PARA_ID,
            block_number: None,
            canonical_prefix: POLKADOT_PREFIX,
            contributors_file: PathBuf::from(DEFAULT_CONTRIBUTORS_FILE),
            contributors_prefix: BIFROST_PREFIX,
            aggregator: AggregatorConfig::default(),
            output_dir: PathBuf::from("."),
            rewards: RewardPolicy::default(),
            key_page_size: DEFAULT_KEY_PAGE_SIZE,
            fetch_concurrency: 1,
        }
    }
}

impl CrowdloanConfig {
    /// Parses a TOML document, filling omitted fields with defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, CrowdloanError> {
        toml::from_str(input).map_err(|err| CrowdloanError::Config(err.to_string()))
    }

    /// Reads and parses the TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self, CrowdloanError> {
        let input = std::fs::read_to_string(path)
            .map_err(|err| CrowdloanError::io(format!("failed to read {}", path.display()), err))?;
        Self::from_toml_str(&input)
    }

    /// Checks that the configuration can drive a run.
    pub fn validate(&self) -> Result<(), CrowdloanError> {
        self.block_number()?;
        if self.endpoint.trim().is_empty() {
            return Err(CrowdloanError::Config("endpoint must not be empty".to_string()));
        }
        if self.key_page_size == 0 {
            return Err(CrowdloanError::Config("key_page_size must be positive".to_string()));
        }
        if self.fetch_concurrency == 0 {
            return Err(CrowdloanError::Config("fetch_concurrency must be positive".to_string()));
        }
        self.rewards.validate()?;
        self.aggregator_account()?;
        Ok(())
    }

    /// Closure block height.
    pub fn block_number(&self) -> Result<u32, CrowdloanError> {
        self.block_number.ok_or_else(|| {
            CrowdloanError::Config("block_number is required (the crowdloan closure block)".to_string())
        })
    }

    /// Normalizer rendering addresses in the canonical format.
    pub const fn normalizer(&self) -> Ss58Normalizer {
        Ss58Normalizer::new(self.canonical_prefix)
    }

    /// Layout of the contributor file.
    pub const fn file_format(&self) -> FileFormat {
        FileFormat { source_prefix: self.contributors_prefix, decimals: self.rewards.source_decimals }
    }

    /// On-chain fetch tuning.
    pub const fn fetch_options(&self) -> FetchOptions {
        FetchOptions { page_size: self.key_page_size, concurrency: self.fetch_concurrency }
    }

    /// Resolved aggregator account.
    pub fn aggregator_account(&self) -> Result<AccountId32, CrowdloanError> {
        self.aggregator.account(&self.normalizer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_constants() {
        let config = CrowdloanConfig::default();
        assert_eq!(config.endpoint, "wss://rpc.polkadot.io");
        assert_eq!(config.para_id, 3370);
        assert_eq!(config.canonical_prefix, 0);
        assert_eq!(config.contributors_prefix, 6);
        assert_eq!(config.contributors_file, PathBuf::from("bifrost_contributors"));
        assert_eq!(config.rewards, RewardPolicy::new(10, 18, 100));
        assert_eq!(config.aggregator_account().unwrap(), parachain_sovereign_account(2030));
        assert_eq!(config.fetch_options(), FetchOptions::default());
    }

    #[test]
    fn block_number_is_required() {
        let err = CrowdloanConfig::default().validate().unwrap_err();
        assert!(matches!(err, CrowdloanError::Config(msg) if msg.contains("block_number")));

        let config = CrowdloanConfig { block_number: Some(20_000_000), ..Default::default() };
        config.validate().unwrap();
    }

    #[test]
    fn parses_partial_toml() {
        let config = CrowdloanConfig::from_toml_str(
            r#"
            endpoint = "http://127.0.0.1:9933"
            block_number = 19_000_000
            output_dir = "out"
            fetch_concurrency = 8

            [rewards]
            multiplier = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint, "http://127.0.0.1:9933");
        assert_eq!(config.block_number, Some(19_000_000));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.fetch_concurrency, 8);
        assert_eq!(config.rewards, RewardPolicy::new(10, 18, 50));
        assert_eq!(config.para_id, DEFAULT_PARA_ID);
        assert_eq!(config.aggregator, AggregatorConfig::Sovereign(DEFAULT_AGGREGATOR_PARA_ID));
    }

    #[test]
    fn parses_aggregator_forms() {
        let config =
            CrowdloanConfig::from_toml_str("aggregator = { sovereign = 2001 }").unwrap();
        assert_eq!(config.aggregator_account().unwrap(), parachain_sovereign_account(2001));

        let alice = "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5";
        let config =
            CrowdloanConfig::from_toml_str(&format!("aggregator = {{ address = \"{alice}\" }}"))
                .unwrap();
        assert_eq!(config.aggregator, AggregatorConfig::Address(alice.to_string()));
        assert_eq!(config.normalizer().encode(&config.aggregator_account().unwrap()), alice);
    }

    #[test]
    fn rejects_invalid_settings() {
        let base = CrowdloanConfig { block_number: Some(1), ..Default::default() };

        let cases = [
            CrowdloanConfig { key_page_size: 0, ..base.clone() },
            CrowdloanConfig { fetch_concurrency: 0, ..base.clone() },
            CrowdloanConfig { endpoint: " ".to_string(), ..base.clone() },
            CrowdloanConfig { rewards: RewardPolicy::new(18, 10, 100), ..base.clone() },
            CrowdloanConfig {
                aggregator: AggregatorConfig::Address("not-an-address".to_string()),
                ..base.clone()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }

        assert!(CrowdloanConfig::from_toml_str("para_id = \"x\"").is_err());
        assert!(CrowdloanConfig::from_toml_str("unknown = 1").is_ok());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crowdloan.toml");
        std::fs::write(&path, "para_id = 2000\nblock_number = 5\n").unwrap();

        let config = CrowdloanConfig::load(&path).unwrap();
        assert_eq!(config.para_id, 2000);
        assert_eq!(config.block_number().unwrap(), 5);

        let err = CrowdloanConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, CrowdloanError::Io { .. }));
    }
}
