//! Account information.
use mtapi_common::types::TradeOperation;
use mtapi_common::{Command, MtCommandType};

use crate::client::MtApiClient;

impl MtApiClient {
    getters! {
        /// Balance.
        account_balance => AccountBalance: f64;
        /// Credit.
        account_credit => AccountCredit: f64;
        /// Brokerage company name.
        account_company => AccountCompany: String;
        /// Deposit currency.
        account_currency => AccountCurrency: String;
        /// Equity.
        account_equity => AccountEquity: f64;
        /// Free margin.
        account_free_margin => AccountFreeMargin: f64;
        /// Margin calculation mode.
        account_free_margin_mode => AccountFreeMarginMode: f64;
        /// Leverage.
        account_leverage => AccountLeverage: i32;
        /// Used margin.
        account_margin => AccountMargin: f64;
        /// Owner name.
        account_name => AccountName: String;
        /// Account number.
        account_number => AccountNumber: i32;
        /// Floating profit.
        account_profit => AccountProfit: f64;
        /// Trade server name.
        account_server => AccountServer: String;
        /// Stop-out level.
        account_stopout_level => AccountStopoutLevel: i32;
        /// Stop-out calculation mode.
        account_stopout_mode => AccountStopoutMode: i32;
    }

    /// Free margin left after opening `volume` lots of `symbol`.
    pub fn account_free_margin_check(&self, symbol: &str, cmd: TradeOperation, volume: f64) -> f64 {
        self.invoke(
            Command::builder(MtCommandType::AccountFreeMarginCheck)
                .arg(symbol)
                .arg(cmd as i32)
                .arg(volume)
                .build(),
        )
    }
}
