//! Operation catalogue shared with the terminal-side expert.
//!
//! Every remote operation is identified by a stable integer id. The ids are
//! part of the wire contract: never renumber an existing entry, append new
//! ones and bump `PROTOCOL_VERSION` when the catalogue changes shape.
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::MtApiError;

/// Version of the catalogue and frame layout, exchanged during the handshake.
pub const PROTOCOL_VERSION: u32 = 2;

/// Remote operation identifiers.
///
/// Variant names follow the terminal's own function names so that the
/// mapping stays greppable from both sides.
#[allow(non_camel_case_types, missing_docs)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum MtCommandType {
    // Trading
    OrderSend = 1,
    OrderClose = 2,
    OrderCloseBy = 3,
    OrderClosePrice = 4,
    OrderClosePriceByTicket = 5,
    OrderCloseTime = 6,
    OrderComment = 7,
    OrderCommission = 8,
    OrderDelete = 9,
    OrderExpiration = 10,
    OrderLots = 11,
    OrderMagicNumber = 12,
    OrderModify = 13,
    OrderOpenPrice = 14,
    OrderOpenPriceByTicket = 15,
    OrderOpenTime = 16,
    OrderPrint = 17,
    OrderProfit = 18,
    OrderSelect = 19,
    OrdersHistoryTotal = 20,
    OrderStopLoss = 21,
    OrdersTotal = 22,
    OrderSwap = 23,
    OrderSymbol = 24,
    OrderTakeProfit = 25,
    OrderTicket = 26,
    OrderType = 27,
    OrderCloseAll = 28,

    // Checkup
    GetLastError = 40,
    IsConnected = 41,
    IsDemo = 42,
    IsDllsAllowed = 43,
    IsExpertEnabled = 44,
    IsLibrariesAllowed = 45,
    IsOptimization = 46,
    IsStopped = 47,
    IsTesting = 48,
    IsTradeAllowed = 49,
    IsTradeContextBusy = 50,
    IsVisualMode = 51,
    UninitializeReason = 52,
    ErrorDescription = 53,

    // Account information
    AccountBalance = 60,
    AccountCredit = 61,
    AccountCompany = 62,
    AccountCurrency = 63,
    AccountEquity = 64,
    AccountFreeMargin = 65,
    AccountFreeMarginCheck = 66,
    AccountFreeMarginMode = 67,
    AccountLeverage = 68,
    AccountMargin = 69,
    AccountName = 70,
    AccountNumber = 71,
    AccountProfit = 72,
    AccountServer = 73,
    AccountStopoutLevel = 74,
    AccountStopoutMode = 75,

    // Common functions
    Alert = 80,
    Comment = 81,
    GetTickCount = 82,
    MarketInfo = 83,
    MessageBox = 84,
    MessageBoxA = 85,
    PlaySound = 86,
    Print = 87,
    SendFTP = 88,
    SendFTPA = 89,
    SendMail = 90,
    Sleep = 91,

    // Client terminal
    TerminalCompany = 100,
    TerminalName = 101,
    TerminalPath = 102,

    // Date and time
    Day = 110,
    DayOfWeek = 111,
    DayOfYear = 112,
    Hour = 113,
    Minute = 114,
    Month = 115,
    Seconds = 116,
    TimeCurrent = 117,
    TimeDay = 118,
    TimeDayOfWeek = 119,
    TimeDayOfYear = 120,
    TimeHour = 121,
    TimeLocal = 122,
    TimeMinute = 123,
    TimeMonth = 124,
    TimeSeconds = 125,
    TimeYear = 126,
    Year = 127,

    // Global variables
    GlobalVariableCheck = 130,
    GlobalVariableDel = 131,
    GlobalVariableGet = 132,
    GlobalVariableName = 133,
    GlobalVariableSet = 134,
    GlobalVariableSetOnCondition = 135,
    GlobalVariablesDeleteAll = 136,
    GlobalVariablesTotal = 137,

    // Technical indicators
    iAC = 150,
    iAD = 151,
    iAlligator = 152,
    iADX = 153,
    iATR = 154,
    iAO = 155,
    iBearsPower = 156,
    iBands = 157,
    iBandsOnArray = 158,
    iBullsPower = 159,
    iCCI = 160,
    iCCIOnArray = 161,
    iCustom = 162,
    iCustom_d = 163,
    iDeMarker = 164,
    iEnvelopes = 165,
    iEnvelopesOnArray = 166,
    iForce = 167,
    iFractals = 168,
    iGator = 169,
    iIchimoku = 170,
    iBWMFI = 171,
    iMomentum = 172,
    iMomentumOnArray = 173,
    iMFI = 174,
    iMA = 175,
    iMAOnArray = 176,
    iOsMA = 177,
    iMACD = 178,
    iOBV = 179,
    iSAR = 180,
    iRSI = 181,
    iRSIOnArray = 182,
    iRVI = 183,
    iStdDev = 184,
    iStdDevOnArray = 185,
    iStochastic = 186,
    iWPR = 187,

    // Timeseries access
    iBars = 200,
    iBarShift = 201,
    iClose = 202,
    iHigh = 203,
    iHighest = 204,
    iLow = 205,
    iLowest = 206,
    iOpen = 207,
    iTime = 208,
    iVolume = 209,
    iCloseArray = 210,
    iHighArray = 211,
    iLowArray = 212,
    iOpenArray = 213,
    iVolumeArray = 214,
    iTimeArray = 215,
    RefreshRates = 216,
}

impl MtCommandType {
    /// Wire identifier of the operation.
    pub fn id(self) -> i32 {
        self as i32
    }

    /// Looks an operation up by its wire identifier.
    pub fn from_id(id: i32) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|op| op.id() == id)
    }
}

impl From<MtCommandType> for i32 {
    fn from(op: MtCommandType) -> Self {
        op.id()
    }
}

impl TryFrom<i32> for MtCommandType {
    type Error = MtApiError;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        MtCommandType::from_id(id)
            .ok_or_else(|| MtApiError::Protocol(format!("unknown operation id {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn identifiers_are_unique() {
        let mut seen = HashSet::new();
        for op in MtCommandType::iter() {
            assert!(seen.insert(op.id()), "duplicate id for {}", op);
        }
        assert_eq!(seen.len(), 154);
    }

    #[test]
    fn delete_all_does_not_share_set_on_condition_id() {
        assert_ne!(
            MtCommandType::GlobalVariablesDeleteAll.id(),
            MtCommandType::GlobalVariableSetOnCondition.id()
        );
        assert_ne!(
            MtCommandType::iRSIOnArray.id(),
            MtCommandType::iMomentumOnArray.id()
        );
    }

    #[test]
    fn from_id_and_names() {
        assert_eq!(MtCommandType::from_id(60), Some(MtCommandType::AccountBalance));
        assert_eq!(MtCommandType::from_id(-5), None);
        assert_eq!(MtCommandType::iCustom_d.to_string(), "iCustom_d");
        assert_eq!(
            "OrderSend".parse::<MtCommandType>().ok(),
            Some(MtCommandType::OrderSend)
        );
    }

    #[test]
    fn serializes_as_integer() {
        let json = serde_json::to_string(&MtCommandType::IsConnected).unwrap();
        assert_eq!(json, "41");
        let back: MtCommandType = serde_json::from_str("41").unwrap();
        assert_eq!(back, MtCommandType::IsConnected);
        assert!(serde_json::from_str::<MtCommandType>("9999").is_err());
    }
}
