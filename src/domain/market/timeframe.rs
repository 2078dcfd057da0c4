use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents different timeframe intervals for market data analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    OneMin,
    FiveMin,
    FifteenMin,
    OneHour,
    FourHour,
    OneDay,
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1Min" | "1m" => Ok(Timeframe::OneMin),
            "5Min" | "5m" => Ok(Timeframe::FiveMin),
            "15Min" | "15m" => Ok(Timeframe::FifteenMin),
            "1Hour" | "1h" => Ok(Timeframe::OneHour),
            "4Hour" | "4h" => Ok(Timeframe::FourHour),
            "1Day" | "1d" => Ok(Timeframe::OneDay),
            _ => Err(anyhow!(
                "Invalid timeframe: {}. Must be one of 1Min, 5Min, 15Min, 1Hour, 4Hour, 1Day",
                s
            )),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::OneMin => "1Min",
            Timeframe::FiveMin => "5Min",
            Timeframe::FifteenMin => "15Min",
            Timeframe::OneHour => "1Hour",
            Timeframe::FourHour => "4Hour",
            Timeframe::OneDay => "1Day",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for tf in [
            Timeframe::OneMin,
            Timeframe::FiveMin,
            Timeframe::FifteenMin,
            Timeframe::OneHour,
            Timeframe::FourHour,
            Timeframe::OneDay,
        ] {
            let parsed: Timeframe = tf.to_string().parse().unwrap();
            assert_eq!(parsed, tf);
        }
    }

    #[test]
    fn test_parse_invalid() {
        assert!("2Week".parse::<Timeframe>().is_err());
    }
}
