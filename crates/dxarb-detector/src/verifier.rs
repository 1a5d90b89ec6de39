//! Spread verifier.
//!
//! Decision order, first failing check wins:
//! 1. no CEX quote: skip, not listed
//! 2. non-positive price on either side: skip, invalid price
//! 3. spread below the band: skip
//! 4. spread above the band: notify only
//! 5. liquidity or 24h volume under the floor: skip
//! 6. otherwise admitted; execute when live trading is on, notify when off
//!
//! Spread is `|dex - cex| / cex * 100`, anchored on the CEX price.

use crate::config::VerifierConfig;
use dxarb_core::{Action, CexQuote, MarketPair, Price, Reason, VerificationResult};
use rust_decimal::Decimal;
use tracing::debug;

pub struct SpreadVerifier {
    config: VerifierConfig,
}

impl SpreadVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Spread in percent, `None` when the CEX price is zero.
    pub fn spread_pct(dex_price: Price, cex_price: Price) -> Option<Decimal> {
        dex_price.abs_pct_from(cex_price)
    }

    /// Verify one pair against its CEX quote. Pure; never fails.
    pub fn verify(
        &self,
        pair: &MarketPair,
        quote: Option<&CexQuote>,
        live_trading: bool,
    ) -> VerificationResult {
        let dex_price = pair.price_usd;

        let Some(quote) = quote else {
            return skip(dex_price, None, Decimal::ZERO, Reason::NotListed);
        };
        let cex_price = quote.price;

        if !dex_price.is_positive() || !cex_price.is_positive() {
            return skip(dex_price, Some(cex_price), Decimal::ZERO, Reason::InvalidPrice);
        }

        let Some(spread_pct) = Self::spread_pct(dex_price, cex_price) else {
            return skip(dex_price, Some(cex_price), Decimal::ZERO, Reason::InvalidPrice);
        };

        let result = |admitted: bool, action: Action, reason: Reason| VerificationResult {
            admitted,
            action,
            spread_pct,
            dex_price,
            cex_price: Some(cex_price),
            reasons: vec![reason],
        };

        let config = &self.config;
        if spread_pct < config.min_spread_pct {
            return result(
                false,
                Action::Skip,
                Reason::SpreadTooLow {
                    spread_pct,
                    min_pct: config.min_spread_pct,
                },
            );
        }
        if spread_pct > config.max_spread_pct {
            debug!(pair = %pair, spread = %spread_pct, "Spread above band");
            return result(
                false,
                Action::Notify,
                Reason::SpreadTooHigh {
                    spread_pct,
                    max_pct: config.max_spread_pct,
                },
            );
        }
        if pair.liquidity_usd < config.min_liquidity_usd {
            return result(
                false,
                Action::Skip,
                Reason::LiquidityTooLow {
                    liquidity_usd: pair.liquidity_usd,
                    min_usd: config.min_liquidity_usd,
                },
            );
        }
        if pair.volume_24h_usd < config.min_volume_24h_usd {
            return result(
                false,
                Action::Skip,
                Reason::VolumeTooLow {
                    volume_usd: pair.volume_24h_usd,
                    min_usd: config.min_volume_24h_usd,
                },
            );
        }

        let action = if live_trading {
            Action::Execute
        } else {
            Action::Notify
        };
        debug!(pair = %pair, spread = %spread_pct, %action, "Pair admitted");
        result(true, action, Reason::AllCriteriaMet)
    }
}

fn skip(
    dex_price: Price,
    cex_price: Option<Price>,
    spread_pct: Decimal,
    reason: Reason,
) -> VerificationResult {
    VerificationResult {
        admitted: false,
        action: Action::Skip,
        spread_pct,
        dex_price,
        cex_price,
        reasons: vec![reason],
    }
}
