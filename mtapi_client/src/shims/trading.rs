//! Trading functions.
use chrono::{DateTime, Utc};
use mtapi_common::color::{to_mt_color, Color};
use mtapi_common::time::to_mt_time_opt;
use mtapi_common::types::{OrderSelectMode, OrderSelectSource, TradeOperation};
use mtapi_common::{Command, MtCommandType};

use crate::client::MtApiClient;

/// Arguments of `OrderSend`. Optional fields default to "not set".
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSendRequest {
    /// Instrument.
    pub symbol: String,
    /// Operation type.
    pub cmd: TradeOperation,
    /// Lots.
    pub volume: f64,
    /// Order price.
    pub price: f64,
    /// Maximum price deviation in points.
    pub slippage: i32,
    /// Stop-loss level, 0 for none.
    pub stoploss: f64,
    /// Take-profit level, 0 for none.
    pub takeprofit: f64,
    /// Order comment.
    pub comment: Option<String>,
    /// Expert identifier.
    pub magic: i32,
    /// Pending order expiration.
    pub expiration: Option<DateTime<Utc>>,
    /// Chart arrow colour.
    pub arrow_color: Option<Color>,
}

impl OrderSendRequest {
    /// Request with the mandatory arguments.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: &str,
        cmd: TradeOperation,
        volume: f64,
        price: f64,
        slippage: i32,
        stoploss: f64,
        takeprofit: f64,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            cmd,
            volume,
            price,
            slippage,
            stoploss,
            takeprofit,
            comment: None,
            magic: 0,
            expiration: None,
            arrow_color: None,
        }
    }

    /// Sets the order comment.
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    /// Sets the expert identifier.
    pub fn with_magic(mut self, magic: i32) -> Self {
        self.magic = magic;
        self
    }

    /// Sets the pending order expiration.
    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Sets the chart arrow colour.
    pub fn with_arrow_color(mut self, color: Color) -> Self {
        self.arrow_color = Some(color);
        self
    }

    fn into_command(self) -> Command {
        Command::builder(MtCommandType::OrderSend)
            .arg(self.symbol)
            .arg(self.cmd as i32)
            .arg(self.volume)
            .arg(self.price)
            .arg(self.slippage)
            .arg(self.stoploss)
            .arg(self.takeprofit)
            .arg(self.comment.unwrap_or_default())
            .arg(self.magic)
            .arg(to_mt_time_opt(self.expiration))
            .arg(to_mt_color(self.arrow_color))
            .build()
    }
}

impl MtApiClient {
    /// Opens an order; returns the ticket, or -1 as reported by the terminal on failure.
    pub fn order_send(&self, request: OrderSendRequest) -> i32 {
        self.invoke(request.into_command())
    }

    /// `order_send` with the price given as text. An unparsable price
    /// returns 0 without contacting the terminal.
    #[allow(clippy::too_many_arguments)]
    pub fn order_send_str(
        &self,
        symbol: &str,
        cmd: TradeOperation,
        volume: f64,
        price: &str,
        slippage: i32,
        stoploss: f64,
        takeprofit: f64,
    ) -> i32 {
        match price.trim().parse::<f64>() {
            Ok(price) => self.order_send(OrderSendRequest::new(
                symbol, cmd, volume, price, slippage, stoploss, takeprofit,
            )),
            Err(_) => 0,
        }
    }

    /// Closes an opened order.
    pub fn order_close(
        &self,
        ticket: i32,
        lots: f64,
        price: f64,
        slippage: i32,
        color: Option<Color>,
    ) -> bool {
        self.invoke(
            Command::builder(MtCommandType::OrderClose)
                .arg(ticket)
                .arg(lots)
                .arg(price)
                .arg(slippage)
                .arg(to_mt_color(color))
                .build(),
        )
    }

    /// Closes an order by an opposite one.
    pub fn order_close_by(&self, ticket: i32, opposite: i32, color: Option<Color>) -> bool {
        self.invoke(
            Command::builder(MtCommandType::OrderCloseBy)
                .arg(ticket)
                .arg(opposite)
                .arg(to_mt_color(color))
                .build(),
        )
    }

    /// Close price of the order with `ticket`.
    pub fn order_close_price_by_ticket(&self, ticket: i32) -> f64 {
        self.invoke(
            Command::builder(MtCommandType::OrderClosePriceByTicket)
                .arg(ticket)
                .build(),
        )
    }

    /// Deletes a pending order.
    pub fn order_delete(&self, ticket: i32, color: Option<Color>) -> bool {
        self.invoke(
            Command::builder(MtCommandType::OrderDelete)
                .arg(ticket)
                .arg(to_mt_color(color))
                .build(),
        )
    }

    /// Modifies an order's levels and expiration.
    pub fn order_modify(
        &self,
        ticket: i32,
        price: f64,
        stoploss: f64,
        takeprofit: f64,
        expiration: Option<DateTime<Utc>>,
        arrow_color: Option<Color>,
    ) -> bool {
        self.invoke(
            Command::builder(MtCommandType::OrderModify)
                .arg(ticket)
                .arg(price)
                .arg(stoploss)
                .arg(takeprofit)
                .arg(to_mt_time_opt(expiration))
                .arg(to_mt_color(arrow_color))
                .build(),
        )
    }

    /// Open price of the order with `ticket`.
    pub fn order_open_price_by_ticket(&self, ticket: i32) -> f64 {
        self.invoke(
            Command::builder(MtCommandType::OrderOpenPriceByTicket)
                .arg(ticket)
                .build(),
        )
    }

    /// Selects an order for the `order_*` getters.
    pub fn order_select(
        &self,
        index: i32,
        select: OrderSelectMode,
        pool: OrderSelectSource,
    ) -> bool {
        self.invoke(
            Command::builder(MtCommandType::OrderSelect)
                .arg(index)
                .arg(select as i32)
                .arg(pool as i32)
                .build(),
        )
    }

    /// Operation type of the selected order.
    pub fn order_type(&self) -> Option<TradeOperation> {
        TradeOperation::from_i32(self.invoke(Command::bare(MtCommandType::OrderType)))
    }

    /// Prints the selected order to the terminal log.
    pub fn order_print(&self) {
        self.invoke::<()>(Command::bare(MtCommandType::OrderPrint))
    }

    getters! {
        /// Close price of the selected order.
        order_close_price => OrderClosePrice: f64;
        /// Close time of the selected order.
        order_close_time => OrderCloseTime: DateTime<Utc>;
        /// Comment of the selected order.
        order_comment => OrderComment: String;
        /// Commission of the selected order.
        order_commission => OrderCommission: f64;
        /// Expiration of the selected pending order.
        order_expiration => OrderExpiration: DateTime<Utc>;
        /// Lots of the selected order.
        order_lots => OrderLots: f64;
        /// Magic number of the selected order.
        order_magic_number => OrderMagicNumber: i32;
        /// Open price of the selected order.
        order_open_price => OrderOpenPrice: f64;
        /// Open time of the selected order.
        order_open_time => OrderOpenTime: DateTime<Utc>;
        /// Profit of the selected order.
        order_profit => OrderProfit: f64;
        /// Number of closed orders in the history.
        orders_history_total => OrdersHistoryTotal: i32;
        /// Stop-loss of the selected order.
        order_stop_loss => OrderStopLoss: f64;
        /// Number of open and pending orders.
        orders_total => OrdersTotal: i32;
        /// Swap of the selected order.
        order_swap => OrderSwap: f64;
        /// Instrument of the selected order.
        order_symbol => OrderSymbol: String;
        /// Take-profit of the selected order.
        order_take_profit => OrderTakeProfit: f64;
        /// Ticket of the selected order.
        order_ticket => OrderTicket: i32;
        /// Closes every open order.
        order_close_all => OrderCloseAll: bool;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mtapi_common::Value;

    #[test]
    fn order_send_parameter_layout() {
        let expiration = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let command = OrderSendRequest::new("EURUSD", TradeOperation::OP_SELL, 0.1, 1.1, 3, 0.0, 0.0)
            .with_comment("hedge")
            .with_magic(42)
            .with_expiration(expiration)
            .into_command();

        assert_eq!(command.operation, MtCommandType::OrderSend);
        assert_eq!(command.parameters.len(), 11);
        assert_eq!(command.parameters[0], Value::Str("EURUSD".to_string()));
        assert_eq!(command.parameters[1], Value::Int(1));
        assert_eq!(command.parameters[7], Value::Str("hedge".to_string()));
        assert_eq!(command.parameters[8], Value::Int(42));
        assert_eq!(command.parameters[9], Value::Int(expiration.timestamp() as i32));
        assert_eq!(command.parameters[10], Value::Int(mtapi_common::color::CLR_NONE));
    }

    #[test]
    fn defaults_leave_optional_fields_unset() {
        let command =
            OrderSendRequest::new("EURUSD", TradeOperation::OP_BUY, 1.0, 1.2, 3, 0.0, 0.0)
                .into_command();
        assert_eq!(command.parameters[7], Value::Str(String::new()));
        assert_eq!(command.parameters[8], Value::Int(0));
        assert_eq!(command.parameters[9], Value::Int(0));
    }
}
