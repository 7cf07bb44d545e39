//! Bundled intel seed
//!
//! Shipped inside the binary so a fresh install with no network and no
//! persisted snapshot still catches the worst offenders. The stores
//! union this data into every refresh; feeds can extend it but never
//! remove it.

/// Well-known official dApp domains. Subdomains of these match too.
pub const TRUSTED_DOMAIN_SEED: &[&str] = &[
    "metamask.io",
    "opensea.io",
    "uniswap.org",
    "app.uniswap.org",
    "pancakeswap.finance",
    "coinbase.com",
    "binance.com",
    "etherscan.io",
    "ledger.com",
    "trezor.io",
    "phantom.app",
    "blur.io",
    "rarible.com",
    "looksrare.org",
    "sushi.com",
    "curve.fi",
    "aave.com",
    "compound.finance",
    "lido.fi",
    "1inch.io",
];

/// OFAC-listed addresses (Tornado Cash contracts, Lazarus wallets,
/// Ronin exploiter). Lowercase, checked offline on every request.
pub const SANCTIONED_ADDRESS_SEED: &[&str] = &[
    // Tornado Cash router / proxy / pools
    "0x8589427373d6d84e98730d7795d8f6f8731fda16",
    "0x722122df12d4e14e13ac3b6895a86e84145b6967",
    "0xd90e2f925da726b50c4ed8d0fb90ad053324f31b",
    "0x910cbd523d972eb0a6f4cae4618ad62622b39dbf",
    // Lazarus Group
    "0x7f367cc41522ce07553e823bf3be79a889debe1b",
    // Ronin Bridge exploiter
    "0x098b716b8aaf21512996dc57eb0615e2383e2f96",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::normalize_address;

    #[test]
    fn test_seed_addresses_normalized() {
        for addr in SANCTIONED_ADDRESS_SEED {
            assert_eq!(normalize_address(addr).as_deref(), Some(*addr));
        }
    }

    #[test]
    fn test_seed_domains_are_bare_hosts() {
        for domain in TRUSTED_DOMAIN_SEED {
            assert!(!domain.contains("://"));
            assert!(!domain.contains('/'));
            assert_eq!(*domain, domain.to_lowercase());
        }
    }
}
