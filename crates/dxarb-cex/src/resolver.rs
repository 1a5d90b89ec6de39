//! DEX token to CEX symbol resolution.
//!
//! The catalog match is a substring test of the token address against
//! catalog symbols and base assets. It ignores the chain and can match
//! unrelated listings; callers confirm a candidate by fetching its ticker.

use dxarb_core::{ChainId, SymbolInfo};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMethod {
    Catalog,
    Convention,
}

/// Candidate CEX symbol for a DEX token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSymbol {
    pub symbol: String,
    pub method: ResolveMethod,
}

#[derive(Debug, Clone)]
pub struct SymbolResolver {
    quote_asset: String,
}

impl Default for SymbolResolver {
    fn default() -> Self {
        Self::new("USDT")
    }
}

impl SymbolResolver {
    pub fn new(quote_asset: impl Into<String>) -> Self {
        Self {
            quote_asset: quote_asset.into().to_uppercase(),
        }
    }

    /// `SYMBOL_QUOTE`, e.g. `PEPE_USDT`.
    pub fn convention_symbol(&self, token_symbol: &str) -> String {
        format!("{}_{}", token_symbol.trim().to_uppercase(), self.quote_asset)
    }

    pub fn resolve(
        &self,
        chain: &ChainId,
        token_address: &str,
        token_symbol: &str,
        catalog: &[SymbolInfo],
    ) -> Option<ResolvedSymbol> {
        let address = token_address.trim().to_lowercase();
        if address.is_empty() || token_symbol.trim().is_empty() {
            return None;
        }

        let matches: Vec<&SymbolInfo> = catalog
            .iter()
            .filter(|s| {
                s.symbol.to_lowercase().contains(&address)
                    || s.base_asset.to_lowercase().contains(&address)
            })
            .collect();

        let preferred = matches
            .iter()
            .find(|s| s.quote_asset.eq_ignore_ascii_case(&self.quote_asset))
            .or_else(|| matches.first());

        if let Some(found) = preferred {
            debug!(chain = %chain, symbol = %found.symbol, "Resolved from catalog");
            return Some(ResolvedSymbol {
                symbol: found.symbol.clone(),
                method: ResolveMethod::Catalog,
            });
        }

        Some(ResolvedSymbol {
            symbol: self.convention_symbol(token_symbol),
            method: ResolveMethod::Convention,
        })
    }
}
