//! Connector factory.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use qg_core::{OrderConstraints, TradingPair};
use qg_gateway::Gateway;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{VenueError, VenueResult};
use crate::exchange::Exchange;
use crate::p2b::{self, P2bExchange};
use crate::stronghold::{self, StrongholdExchange, WithdrawKeys};

/// Venues with a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    #[serde(alias = "p2b")]
    P2pb2b,
    Stronghold,
}

impl VenueKind {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::P2pb2b => p2b::DEFAULT_BASE_URL,
            Self::Stronghold => stronghold::DEFAULT_BASE_URL,
        }
    }

    pub fn default_delimiter(&self) -> &'static str {
        match self {
            Self::P2pb2b => p2b::DEFAULT_DELIMITER,
            Self::Stronghold => stronghold::DEFAULT_DELIMITER,
        }
    }
}

impl fmt::Display for VenueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P2pb2b => f.write_str(p2b::VENUE_NAME),
            Self::Stronghold => f.write_str(stronghold::VENUE_NAME),
        }
    }
}

impl FromStr for VenueKind {
    type Err = VenueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p2pb2b" | "p2b" => Ok(Self::P2pb2b),
            "stronghold" => Ok(Self::Stronghold),
            other => Err(VenueError::UnknownVenue(other.to_string())),
        }
    }
}

/// Connector options taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct ExchangeOptions {
    pub simulated: bool,
    /// Market delimiter; the venue default when `None`.
    pub delimiter: Option<String>,
    /// Added to or replacing the venue's built-in constraint table.
    pub precision_overrides: Vec<(TradingPair, OrderConstraints)>,
    /// Registered withdrawal destinations, for venues that need them.
    pub withdraw_keys: WithdrawKeys,
}

/// Build the connector for `kind` on top of a configured gateway.
///
/// A live (non-simulated) connector needs at least one credential.
pub fn make_exchange(
    kind: VenueKind,
    gateway: Arc<Gateway>,
    options: ExchangeOptions,
) -> VenueResult<Arc<dyn Exchange>> {
    if !options.simulated && gateway.state().credential_count() == 0 {
        return Err(VenueError::Config(format!(
            "{kind} needs at least one API credential"
        )));
    }

    let mut precision = match kind {
        VenueKind::P2pb2b => p2b::default_precision(),
        VenueKind::Stronghold => stronghold::default_precision(),
    };
    for (pair, constraints) in options.precision_overrides {
        precision.insert(pair, constraints);
    }
    let delimiter = options
        .delimiter
        .unwrap_or_else(|| kind.default_delimiter().to_string());

    info!(
        venue = %kind,
        simulated = options.simulated,
        pairs = precision.len(),
        credentials = gateway.state().credential_count(),
        routes = gateway.state().route_count(),
        withdraw_keys = options.withdraw_keys.len(),
        "Exchange connector ready"
    );

    let exchange: Arc<dyn Exchange> = match kind {
        VenueKind::P2pb2b => Arc::new(
            P2bExchange::new(gateway, precision)
                .with_delimiter(delimiter)
                .simulated(options.simulated),
        ),
        VenueKind::Stronghold => Arc::new(
            StrongholdExchange::new(gateway, precision)
                .with_delimiter(delimiter)
                .with_withdraw_keys(options.withdraw_keys)
                .simulated(options.simulated),
        ),
    };
    Ok(exchange)
}

#[cfg(test)]
mod tests {
    use qg_gateway::{Credentials, GatewayConfig, MockTransport};
    use rust_decimal_macros::dec;

    use super::*;

    fn gateway(credentials: Vec<Credentials>) -> Arc<Gateway> {
        Arc::new(
            Gateway::new(
                GatewayConfig::new(p2b::DEFAULT_BASE_URL),
                MockTransport::shared(),
            )
            .with_credentials(credentials),
        )
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("p2pb2b".parse::<VenueKind>().unwrap(), VenueKind::P2pb2b);
        assert_eq!("Stronghold".parse::<VenueKind>().unwrap(), VenueKind::Stronghold);
        assert_eq!("P2B".parse::<VenueKind>().unwrap(), VenueKind::P2pb2b);
        assert!(matches!(
            "kraken".parse::<VenueKind>(),
            Err(VenueError::UnknownVenue(_))
        ));
    }

    #[test]
    fn test_live_connector_requires_credentials() {
        let res = make_exchange(VenueKind::P2pb2b, gateway(vec![]), ExchangeOptions::default());
        assert!(matches!(res, Err(VenueError::Config(_))));

        let simulated = ExchangeOptions {
            simulated: true,
            ..ExchangeOptions::default()
        };
        assert!(make_exchange(VenueKind::P2pb2b, gateway(vec![]), simulated).is_ok());
    }

    #[test]
    fn test_precision_overrides_applied() {
        let pair = TradingPair::new("XLM", "USD");
        let options = ExchangeOptions {
            precision_overrides: vec![(pair.clone(), OrderConstraints::new(6, 2, dec!(10)))],
            ..ExchangeOptions::default()
        };
        let ex = make_exchange(
            VenueKind::P2pb2b,
            gateway(vec![Credentials::new("k", "s")]),
            options,
        )
        .unwrap();

        assert_eq!(ex.name(), "p2pb2b");
        assert_eq!(
            ex.get_order_constraints(&pair),
            Some(OrderConstraints::new(6, 2, dec!(10)))
        );
        assert!(ex
            .get_order_constraints(&TradingPair::new("XLM", "BTC"))
            .is_some());
    }

    #[tokio::test]
    async fn test_stronghold_connector() {
        let mut keys = WithdrawKeys::default();
        keys.insert(qg_core::Asset::new("XLM"), "GDEST", "cold-wallet");
        let options = ExchangeOptions {
            simulated: true,
            withdraw_keys: keys,
            ..ExchangeOptions::default()
        };
        let ex = make_exchange(VenueKind::Stronghold, gateway(vec![]), options).unwrap();

        assert_eq!(ex.name(), "stronghold");
        assert_eq!(VenueKind::Stronghold.default_delimiter(), "");
        assert_eq!(
            ex.get_order_constraints(&TradingPair::new("BTC", "USD")),
            Some(OrderConstraints::new(1, 8, dec!(0.002)))
        );
        // the key table reaches the connector: an unknown address fails locally
        let err = ex
            .withdraw_funds(
                &qg_core::Asset::new("XLM"),
                qg_core::Number::new(dec!(1), 7),
                "GOTHER",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VenueError::UnknownWithdrawKey { .. }));
    }
}
