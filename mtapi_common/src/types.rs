//! Terminal enumerations used as command parameters.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Special "null" constant accepted by many terminal functions.
pub const NULL: i32 = 0;
/// Special "empty" constant accepted by many terminal functions.
pub const EMPTY: i32 = -1;

/// Order operation type.
#[allow(non_camel_case_types, missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[repr(i32)]
pub enum TradeOperation {
    OP_BUY = 0,
    OP_SELL = 1,
    OP_BUYLIMIT = 2,
    OP_SELLLIMIT = 3,
    OP_BUYSTOP = 4,
    OP_SELLSTOP = 5,
}

impl TradeOperation {
    /// Decodes the integer returned by `OrderType`.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(TradeOperation::OP_BUY),
            1 => Some(TradeOperation::OP_SELL),
            2 => Some(TradeOperation::OP_BUYLIMIT),
            3 => Some(TradeOperation::OP_SELLLIMIT),
            4 => Some(TradeOperation::OP_BUYSTOP),
            5 => Some(TradeOperation::OP_SELLSTOP),
            _ => None,
        }
    }
}

/// How `OrderSelect` interprets its index argument.
#[allow(non_camel_case_types, missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[repr(i32)]
pub enum OrderSelectMode {
    SELECT_BY_POS = 0,
    SELECT_BY_TICKET = 1,
}

/// Pool `OrderSelect` searches in.
#[allow(non_camel_case_types, missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[repr(i32)]
pub enum OrderSelectSource {
    MODE_TRADES = 0,
    MODE_HISTORY = 1,
}

/// Chart timeframe in minutes (`PERIOD_CURRENT` = 0).
#[allow(non_camel_case_types, missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, ValueEnum)]
#[strum(ascii_case_insensitive)]
#[repr(i32)]
pub enum ChartPeriod {
    #[value(name = "current")]
    PERIOD_CURRENT = 0,
    #[value(name = "m1")]
    PERIOD_M1 = 1,
    #[value(name = "m5")]
    PERIOD_M5 = 5,
    #[value(name = "m15")]
    PERIOD_M15 = 15,
    #[value(name = "m30")]
    PERIOD_M30 = 30,
    #[value(name = "h1")]
    PERIOD_H1 = 60,
    #[value(name = "h4")]
    PERIOD_H4 = 240,
    #[value(name = "d1")]
    PERIOD_D1 = 1440,
    #[value(name = "w1")]
    PERIOD_W1 = 10080,
    #[value(name = "mn1")]
    PERIOD_MN1 = 43200,
}

/// Series selector for `iHighest`/`iLowest`.
#[allow(non_camel_case_types, missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[repr(i32)]
pub enum SeriesIdentifier {
    MODE_OPEN = 0,
    MODE_LOW = 1,
    MODE_HIGH = 2,
    MODE_CLOSE = 3,
    MODE_VOLUME = 4,
    MODE_TIME = 5,
}

/// Property selector for `MarketInfo`.
#[allow(non_camel_case_types, missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[repr(i32)]
pub enum MarketInfoModeType {
    MODE_LOW = 1,
    MODE_HIGH = 2,
    MODE_TIME = 5,
    MODE_BID = 9,
    MODE_ASK = 10,
    MODE_POINT = 11,
    MODE_DIGITS = 12,
    MODE_SPREAD = 13,
    MODE_STOPLEVEL = 14,
    MODE_LOTSIZE = 15,
    MODE_TICKVALUE = 16,
    MODE_TICKSIZE = 17,
    MODE_SWAPLONG = 18,
    MODE_SWAPSHORT = 19,
    MODE_STARTING = 20,
    MODE_EXPIRATION = 21,
    MODE_TRADEALLOWED = 22,
    MODE_MINLOT = 23,
    MODE_LOTSTEP = 24,
    MODE_MAXLOT = 25,
    MODE_SWAPTYPE = 26,
    MODE_PROFITCALCMODE = 27,
    MODE_MARGINCALCMODE = 28,
    MODE_MARGININIT = 29,
    MODE_MARGINMAINTENANCE = 30,
    MODE_MARGINHEDGED = 31,
    MODE_MARGINREQUIRED = 32,
    MODE_FREEZELEVEL = 33,
}
