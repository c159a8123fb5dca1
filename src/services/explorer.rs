use crate::models::is_placeholder_hash;
use reqwest::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Sepolia,
    Holesky,
    Polygon,
    Amoy,
    Base,
    BaseSepolia,
}

impl Network {
    /// Parse a network identifier. Unknown identifiers return `None`.
    pub fn parse(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "mainnet" | "ethereum" | "homestead" => Some(Network::Mainnet),
            "sepolia" => Some(Network::Sepolia),
            "holesky" => Some(Network::Holesky),
            "polygon" | "matic" => Some(Network::Polygon),
            "amoy" | "polygon-amoy" => Some(Network::Amoy),
            "base" => Some(Network::Base),
            "base-sepolia" | "base_sepolia" => Some(Network::BaseSepolia),
            _ => None,
        }
    }

    pub fn explorer_base(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://etherscan.io",
            Network::Sepolia => "https://sepolia.etherscan.io",
            Network::Holesky => "https://holesky.etherscan.io",
            Network::Polygon => "https://polygonscan.com",
            Network::Amoy => "https://amoy.polygonscan.com",
            Network::Base => "https://basescan.org",
            Network::BaseSepolia => "https://sepolia.basescan.org",
        }
    }
}

/// Maps transaction hashes to public block-explorer pages.
#[derive(Debug, Clone)]
pub struct ExplorerLinkResolver {
    default_network: Network,
}

impl Default for ExplorerLinkResolver {
    fn default() -> Self {
        Self::new(Network::Sepolia)
    }
}

impl ExplorerLinkResolver {
    pub fn new(default_network: Network) -> Self {
        Self { default_network }
    }

    pub fn default_network(&self) -> Network {
        self.default_network
    }

    /// Explorer URL for a transaction, or `None` when the hash is missing or
    /// a placeholder that never reached the chain.
    pub fn resolve(&self, transaction_hash: Option<&str>, network: &str) -> Option<Url> {
        let hash = transaction_hash.map(str::trim).filter(|h| !h.is_empty())?;
        if is_placeholder_hash(hash) {
            return None;
        }

        let network = Network::parse(network).unwrap_or_else(|| {
            tracing::debug!(
                "Unknown network '{}', falling back to {:?}",
                network,
                self.default_network
            );
            self.default_network
        });

        let mut url = Url::parse(network.explorer_base()).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push("tx")
            .push(hash);
        Some(url)
    }
}
