//! Stateful command handler with a demo account.
//!
//! Covers trading, account, status, terminal, date/time, global variable,
//! market info and timeseries operations. Bars are synthesised from the
//! current bid so repeated calls agree with each other. Indicators other
//! than moving averages are not simulated and answer zero.
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Datelike, Timelike, Utc};
use log::{debug, info};
use mtapi_common::time::{from_mt_time, to_mt_time};
use mtapi_common::types::{ChartPeriod, MarketInfoModeType, TradeOperation};
use mtapi_common::{Command, MtCommandType, MtQuote, ResponseEnvelope, Value};

use crate::session::CommandHandler;

/// Terminal error codes reported through `GetLastError`.
pub mod errors {
    /// No error.
    pub const ERR_NO_ERROR: i32 = 0;
    /// Invalid trade parameters.
    pub const ERR_INVALID_TRADE_PARAMETERS: i32 = 3;
    /// Not enough money.
    pub const ERR_NOT_ENOUGH_MONEY: i32 = 134;
    /// Invalid function parameter value.
    pub const ERR_INVALID_FUNCTION_PARAMVALUE: i32 = 4051;
    /// Global variable not found.
    pub const ERR_GLOBAL_VARIABLE_NOT_FOUND: i32 = 4058;
    /// Unknown symbol.
    pub const ERR_UNKNOWN_SYMBOL: i32 = 4106;
    /// Invalid ticket.
    pub const ERR_INVALID_TICKET: i32 = 4108;
}
use errors::*;

/// Bars available per instrument and timeframe.
pub const BARS: usize = 100;
const CONTRACT_SIZE: f64 = 100_000.0;
const MAX_SLEEP: Duration = Duration::from_secs(10);
const IDOK: i32 = 1;

#[derive(Debug, Clone)]
struct Order {
    ticket: i32,
    symbol: String,
    cmd: TradeOperation,
    lots: f64,
    open_price: f64,
    open_time: i32,
    close_price: f64,
    close_time: i32,
    stoploss: f64,
    takeprofit: f64,
    expiration: i32,
    comment: String,
    magic: i32,
}

impl Order {
    fn is_buy(&self) -> bool {
        matches!(
            self.cmd,
            TradeOperation::OP_BUY | TradeOperation::OP_BUYLIMIT | TradeOperation::OP_BUYSTOP
        )
    }

    fn is_market(&self) -> bool {
        matches!(self.cmd, TradeOperation::OP_BUY | TradeOperation::OP_SELL)
    }

    fn profit(&self, quotes: &BTreeMap<String, MtQuote>) -> f64 {
        if !self.is_market() {
            return 0.0;
        }
        let exit = if self.close_time > 0 {
            self.close_price
        } else {
            match quotes.get(&self.symbol) {
                Some(q) if self.is_buy() => q.bid,
                Some(q) => q.ask,
                None => self.open_price,
            }
        };
        let direction = if self.is_buy() { 1.0 } else { -1.0 };
        direction * (exit - self.open_price) * self.lots * CONTRACT_SIZE
    }
}

#[derive(Debug)]
struct Account {
    number: i32,
    name: String,
    company: String,
    server: String,
    currency: String,
    leverage: i32,
    balance: f64,
    credit: f64,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            number: 1_000_001,
            name: "Demo Trader".to_string(),
            company: "MtApi Simulations Ltd.".to_string(),
            server: "MtApi-Demo".to_string(),
            currency: "USD".to_string(),
            leverage: 100,
            balance: 10_000.0,
            credit: 0.0,
        }
    }
}

#[derive(Debug)]
struct State {
    account: Account,
    quotes: BTreeMap<String, MtQuote>,
    orders: Vec<Order>,
    history: Vec<Order>,
    selected: Option<Order>,
    globals: BTreeMap<String, (f64, i32)>,
    next_ticket: i32,
    last_error: i32,
}

/// In-memory terminal used by the standalone binary and by tests.
#[derive(Debug)]
pub struct SimulatedTerminal {
    state: Mutex<State>,
    started: Instant,
}

impl Default for SimulatedTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTerminal {
    /// Terminal quoting EURUSD, GBPUSD and USDJPY.
    pub fn new() -> Self {
        Self::with_quotes(vec![
            MtQuote {
                instrument: "EURUSD".to_string(),
                bid: 1.1000,
                ask: 1.1002,
            },
            MtQuote {
                instrument: "GBPUSD".to_string(),
                bid: 1.2500,
                ask: 1.2503,
            },
            MtQuote {
                instrument: "USDJPY".to_string(),
                bid: 150.00,
                ask: 150.02,
            },
        ])
    }

    /// Terminal quoting exactly `quotes`.
    pub fn with_quotes(quotes: Vec<MtQuote>) -> Self {
        Self {
            state: Mutex::new(State {
                account: Account::default(),
                quotes: quotes
                    .into_iter()
                    .map(|q| (q.instrument.clone(), q))
                    .collect(),
                orders: Vec::new(),
                history: Vec::new(),
                selected: None,
                globals: BTreeMap::new(),
                next_ticket: 1,
                last_error: ERR_NO_ERROR,
            }),
            started: Instant::now(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or replaces a quote; returns the previous one.
    pub fn set_quote(&self, quote: MtQuote) -> Option<MtQuote> {
        self.state().quotes.insert(quote.instrument.clone(), quote)
    }

    /// Removes a quote.
    pub fn remove_quote(&self, instrument: &str) -> Option<MtQuote> {
        self.state().quotes.remove(instrument)
    }

    /// Current quote for `instrument`.
    pub fn quote(&self, instrument: &str) -> Option<MtQuote> {
        self.state().quotes.get(instrument).cloned()
    }

    /// Account balance.
    pub fn balance(&self) -> f64 {
        self.state().account.balance
    }

    /// Number of open and pending orders.
    pub fn open_orders(&self) -> usize {
        self.state().orders.len()
    }

    /// Value of a global variable.
    pub fn global_variable(&self, name: &str) -> Option<f64> {
        self.state().globals.get(name).map(|(value, _)| *value)
    }
}

impl CommandHandler for SimulatedTerminal {
    fn handle(&self, command: &Command) -> Option<ResponseEnvelope> {
        match command.operation {
            // Runs outside the state lock so other requests proceed meanwhile.
            MtCommandType::Sleep => {
                let millis = u64::try_from(int(command, 0)).unwrap_or_default();
                thread::sleep(Duration::from_millis(millis).min(MAX_SLEEP));
                None
            }
            MtCommandType::GetTickCount => {
                let elapsed = self.started.elapsed().as_millis();
                Some(ResponseEnvelope::Int(i32::try_from(elapsed).unwrap_or(i32::MAX)))
            }
            _ => execute(&mut self.state(), command),
        }
    }

    fn quotes(&self) -> Vec<MtQuote> {
        self.state().quotes.values().cloned().collect()
    }
}

fn int(command: &Command, index: usize) -> i32 {
    command.param(index).and_then(Value::as_i32).unwrap_or_default()
}

fn double(command: &Command, index: usize) -> f64 {
    command.param(index).and_then(Value::as_f64).unwrap_or_default()
}

fn flag(command: &Command, index: usize) -> bool {
    command.param(index).and_then(Value::as_bool).unwrap_or_default()
}

fn text(command: &Command, index: usize) -> String {
    command
        .param(index)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Reads a length-prefixed array starting at `index`; returns it with the
/// index of the next parameter.
fn counted(command: &Command, index: usize) -> (Vec<f64>, usize) {
    let len = usize::try_from(int(command, index)).unwrap_or_default();
    let values = (0..len).map(|i| double(command, index + 1 + i)).collect();
    (values, index + 1 + len)
}

fn now() -> i32 {
    to_mt_time(Utc::now())
}

fn double_reply(value: f64) -> Option<ResponseEnvelope> {
    Some(ResponseEnvelope::Double(value))
}

fn int_reply(value: i32) -> Option<ResponseEnvelope> {
    Some(ResponseEnvelope::Int(value))
}

fn bool_reply(value: bool) -> Option<ResponseEnvelope> {
    Some(ResponseEnvelope::Bool(value))
}

fn string_reply(value: impl Into<String>) -> Option<ResponseEnvelope> {
    Some(ResponseEnvelope::String(value.into()))
}

fn time_part(time: DateTime<Utc>, operation: MtCommandType) -> i32 {
    let part = match operation {
        MtCommandType::Day | MtCommandType::TimeDay => time.day(),
        MtCommandType::DayOfWeek | MtCommandType::TimeDayOfWeek => {
            time.weekday().num_days_from_sunday()
        }
        MtCommandType::DayOfYear | MtCommandType::TimeDayOfYear => time.ordinal(),
        MtCommandType::Hour | MtCommandType::TimeHour => time.hour(),
        MtCommandType::Minute | MtCommandType::TimeMinute => time.minute(),
        MtCommandType::Month | MtCommandType::TimeMonth => time.month(),
        MtCommandType::Seconds | MtCommandType::TimeSeconds => time.second(),
        _ => return time.year(),
    };
    part as i32
}

fn error_description(code: i32) -> &'static str {
    match code {
        ERR_NO_ERROR => "no error",
        ERR_INVALID_TRADE_PARAMETERS => "invalid trade parameters",
        ERR_NOT_ENOUGH_MONEY => "not enough money",
        ERR_INVALID_FUNCTION_PARAMVALUE => "invalid function parameter value",
        ERR_GLOBAL_VARIABLE_NOT_FOUND => "global variable not found",
        ERR_UNKNOWN_SYMBOL => "unknown symbol",
        ERR_INVALID_TICKET => "invalid ticket",
        _ => "unknown error",
    }
}

impl State {
    fn floating_profit(&self) -> f64 {
        self.orders.iter().map(|o| o.profit(&self.quotes)).sum()
    }

    fn equity(&self) -> f64 {
        self.account.balance + self.account.credit + self.floating_profit()
    }

    fn margin_for(&self, symbol: &str, lots: f64) -> f64 {
        let price = self.quotes.get(symbol).map(|q| q.ask).unwrap_or(1.0);
        lots * CONTRACT_SIZE * price / f64::from(self.account.leverage.max(1))
    }

    fn margin(&self) -> f64 {
        self.orders
            .iter()
            .filter(|o| o.is_market())
            .map(|o| self.margin_for(&o.symbol, o.lots))
            .sum()
    }

    fn fail<T>(&mut self, code: i32, value: T) -> T {
        self.last_error = code;
        value
    }

    fn order_send(&mut self, command: &Command) -> i32 {
        let symbol = text(command, 0);
        let Some(quote) = self.quotes.get(&symbol).cloned() else {
            return self.fail(ERR_UNKNOWN_SYMBOL, -1);
        };
        let Some(cmd) = TradeOperation::from_i32(int(command, 1)) else {
            return self.fail(ERR_INVALID_TRADE_PARAMETERS, -1);
        };
        let lots = double(command, 2);
        if lots <= 0.0 {
            return self.fail(ERR_INVALID_TRADE_PARAMETERS, -1);
        }
        let open_price = match cmd {
            TradeOperation::OP_BUY => quote.ask,
            TradeOperation::OP_SELL => quote.bid,
            _ => double(command, 3),
        };
        if self.margin() + self.margin_for(&symbol, lots) > self.equity() {
            return self.fail(ERR_NOT_ENOUGH_MONEY, -1);
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.orders.push(Order {
            ticket,
            symbol,
            cmd,
            lots,
            open_price,
            open_time: now(),
            close_price: 0.0,
            close_time: 0,
            stoploss: double(command, 5),
            takeprofit: double(command, 6),
            comment: text(command, 7),
            magic: int(command, 8),
            expiration: int(command, 9),
        });
        info!("Order {} opened: {} {} lots at {}", ticket, cmd, lots, open_price);
        ticket
    }

    /// Closes `ticket` at the current price, or at `price` when the quote is gone.
    fn close_order(&mut self, ticket: i32, price: f64) -> bool {
        let Some(position) = self.orders.iter().position(|o| o.ticket == ticket) else {
            return self.fail(ERR_INVALID_TICKET, false);
        };
        let mut order = self.orders.remove(position);
        order.close_price = match self.quotes.get(&order.symbol) {
            Some(q) if order.is_buy() => q.bid,
            Some(q) => q.ask,
            None => price,
        };
        order.close_time = now();
        let profit = order.profit(&self.quotes);
        self.account.balance += profit;
        info!("Order {} closed with profit {:.2}", ticket, profit);
        self.history.push(order);
        true
    }

    fn find(&self, ticket: i32) -> Option<&Order> {
        self.orders
            .iter()
            .chain(self.history.iter())
            .find(|o| o.ticket == ticket)
    }

    fn order_select(&mut self, command: &Command) -> bool {
        let index = int(command, 0);
        let by_ticket = int(command, 1) == 1;
        let from_history = int(command, 2) == 1;
        let found = if by_ticket {
            self.find(index).cloned()
        } else {
            let pool = if from_history { &self.history } else { &self.orders };
            usize::try_from(index).ok().and_then(|i| pool.get(i)).cloned()
        };
        match found {
            Some(order) => {
                self.selected = Some(order);
                true
            }
            None => self.fail(ERR_INVALID_TICKET, false),
        }
    }

    /// Applies `read` to the selected order, refreshed from the live book.
    fn selected<T: Default>(&mut self, read: impl FnOnce(&Order, &BTreeMap<String, MtQuote>) -> T) -> T {
        let Some(ticket) = self.selected.as_ref().map(|o| o.ticket) else {
            return self.fail(ERR_INVALID_TICKET, T::default());
        };
        if let Some(order) = self.find(ticket).cloned() {
            self.selected = Some(order);
        }
        match &self.selected {
            Some(order) => read(order, &self.quotes),
            None => T::default(),
        }
    }

    fn market_info(&mut self, command: &Command) -> f64 {
        let symbol = text(command, 0);
        let Some(quote) = self.quotes.get(&symbol).cloned() else {
            return self.fail(ERR_UNKNOWN_SYMBOL, 0.0);
        };
        let digits = if quote.bid >= 10.0 { 3 } else { 5 };
        let point = 10f64.powi(-digits);
        let mode = int(command, 1);
        let value = |m: MarketInfoModeType| m as i32 == mode;
        if value(MarketInfoModeType::MODE_BID) {
            quote.bid
        } else if value(MarketInfoModeType::MODE_ASK) {
            quote.ask
        } else if value(MarketInfoModeType::MODE_POINT) || value(MarketInfoModeType::MODE_TICKSIZE) {
            point
        } else if value(MarketInfoModeType::MODE_DIGITS) {
            f64::from(digits)
        } else if value(MarketInfoModeType::MODE_SPREAD) {
            ((quote.ask - quote.bid) / point).round()
        } else if value(MarketInfoModeType::MODE_LOTSIZE) {
            CONTRACT_SIZE
        } else if value(MarketInfoModeType::MODE_MINLOT) || value(MarketInfoModeType::MODE_LOTSTEP) {
            0.01
        } else if value(MarketInfoModeType::MODE_MAXLOT) {
            100.0
        } else if value(MarketInfoModeType::MODE_TRADEALLOWED) {
            1.0
        } else if value(MarketInfoModeType::MODE_TIME) {
            f64::from(now())
        } else {
            debug!("MarketInfo mode {} not simulated", mode);
            0.0
        }
    }

    fn bars(&mut self, command: &Command) -> Option<Bars> {
        let symbol = text(command, 0);
        match self.quotes.get(&symbol) {
            Some(quote) => Some(Bars::new(quote.bid, int(command, 1), now())),
            None => self.fail(ERR_UNKNOWN_SYMBOL, None),
        }
    }
}

/// Synthetic bar history, index 0 being the current bar.
struct Bars {
    price: f64,
    period_secs: i32,
    current_open: i32,
}

impl Bars {
    fn new(price: f64, period: i32, now: i32) -> Self {
        let minutes = if period <= 0 {
            ChartPeriod::PERIOD_H1 as i32
        } else {
            period
        };
        let period_secs = minutes.saturating_mul(60);
        Self {
            price,
            period_secs,
            current_open: now - now.rem_euclid(period_secs),
        }
    }

    fn close(&self, shift: usize) -> f64 {
        self.price * (1.0 + 0.0005 * (shift as f64 * 0.7).sin())
    }

    fn open(&self, shift: usize) -> f64 {
        self.close(shift + 1)
    }

    fn high(&self, shift: usize) -> f64 {
        self.open(shift).max(self.close(shift)) + self.price * 0.0002
    }

    fn low(&self, shift: usize) -> f64 {
        self.open(shift).min(self.close(shift)) - self.price * 0.0002
    }

    fn volume(&self, shift: usize) -> f64 {
        (100 + (shift * 37) % 400) as f64
    }

    fn time(&self, shift: usize) -> i32 {
        self.current_open - self.period_secs * shift as i32
    }

    /// Series by `SeriesIdentifier` value.
    fn series(&self, mode: i32, shift: usize) -> f64 {
        match mode {
            0 => self.open(shift),
            1 => self.low(shift),
            2 => self.high(shift),
            3 => self.close(shift),
            4 => self.volume(shift),
            _ => f64::from(self.time(shift)),
        }
    }

    fn shift_of(&self, time: i32, exact: bool) -> i32 {
        let offset = self.current_open + self.period_secs - 1 - time;
        if offset < 0 {
            return 0;
        }
        if exact && (self.current_open - time).rem_euclid(self.period_secs) != 0 {
            return -1;
        }
        let shift = offset / self.period_secs;
        match usize::try_from(shift) {
            Ok(s) if s < BARS => shift,
            _ if exact => -1,
            _ => BARS as i32 - 1,
        }
    }

    fn collect(&self, read: impl Fn(&Self, usize) -> f64) -> Vec<f64> {
        (0..BARS).map(|i| read(self, i)).collect()
    }
}

fn shift_index(command: &Command, index: usize) -> Option<usize> {
    usize::try_from(int(command, index)).ok().filter(|s| *s < BARS)
}

fn simple_average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn execute(state: &mut State, command: &Command) -> Option<ResponseEnvelope> {
    use MtCommandType::*;

    match command.operation {
        // Trading
        OrderSend => int_reply(state.order_send(command)),
        OrderClose => {
            let closed = state.close_order(int(command, 0), double(command, 2));
            bool_reply(closed)
        }
        OrderCloseBy => {
            let first = state.close_order(int(command, 0), 0.0);
            let second = first && state.close_order(int(command, 1), 0.0);
            bool_reply(second)
        }
        OrderCloseAll => {
            let tickets: Vec<i32> = state.orders.iter().map(|o| o.ticket).collect();
            let all = tickets
                .into_iter()
                .fold(true, |ok, ticket| state.close_order(ticket, 0.0) && ok);
            bool_reply(all)
        }
        OrderDelete => {
            let ticket = int(command, 0);
            match state.orders.iter().position(|o| o.ticket == ticket && !o.is_market()) {
                Some(position) => {
                    let mut order = state.orders.remove(position);
                    order.close_time = now();
                    state.history.push(order);
                    bool_reply(true)
                }
                None => bool_reply(state.fail(ERR_INVALID_TICKET, false)),
            }
        }
        OrderModify => {
            let ticket = int(command, 0);
            match state.orders.iter_mut().find(|o| o.ticket == ticket) {
                Some(order) => {
                    if !order.is_market() {
                        order.open_price = double(command, 1);
                    }
                    order.stoploss = double(command, 2);
                    order.takeprofit = double(command, 3);
                    order.expiration = int(command, 4);
                    bool_reply(true)
                }
                None => bool_reply(state.fail(ERR_INVALID_TICKET, false)),
            }
        }
        OrderSelect => bool_reply(state.order_select(command)),
        OrdersTotal => int_reply(state.orders.len() as i32),
        OrdersHistoryTotal => int_reply(state.history.len() as i32),
        OrderClosePriceByTicket | OrderOpenPriceByTicket => {
            let ticket = int(command, 0);
            let price = state.find(ticket).map(|o| {
                if command.operation == OrderOpenPriceByTicket {
                    o.open_price
                } else {
                    o.close_price
                }
            });
            match price {
                Some(price) => double_reply(price),
                None => double_reply(state.fail(ERR_INVALID_TICKET, 0.0)),
            }
        }
        OrderClosePrice => double_reply(state.selected(|o, _| o.close_price)),
        OrderCloseTime => int_reply(state.selected(|o, _| o.close_time)),
        OrderComment => string_reply(state.selected(|o, _| o.comment.clone())),
        OrderCommission | OrderSwap => double_reply(0.0),
        OrderExpiration => int_reply(state.selected(|o, _| o.expiration)),
        OrderLots => double_reply(state.selected(|o, _| o.lots)),
        OrderMagicNumber => int_reply(state.selected(|o, _| o.magic)),
        OrderOpenPrice => double_reply(state.selected(|o, _| o.open_price)),
        OrderOpenTime => int_reply(state.selected(|o, _| o.open_time)),
        OrderProfit => double_reply(state.selected(|o, quotes| o.profit(quotes))),
        OrderStopLoss => double_reply(state.selected(|o, _| o.stoploss)),
        OrderSymbol => string_reply(state.selected(|o, _| o.symbol.clone())),
        OrderTakeProfit => double_reply(state.selected(|o, _| o.takeprofit)),
        OrderTicket => int_reply(state.selected(|o, _| o.ticket)),
        OrderType => int_reply(state.selected(|o, _| o.cmd as i32)),
        OrderPrint => {
            if let Some(order) = &state.selected {
                info!("{:?}", order);
            }
            None
        }

        // Checkup
        GetLastError => int_reply(std::mem::replace(&mut state.last_error, ERR_NO_ERROR)),
        ErrorDescription => string_reply(error_description(int(command, 0))),
        IsConnected | IsDemo | IsExpertEnabled | IsLibrariesAllowed | IsTradeAllowed => {
            bool_reply(true)
        }
        IsDllsAllowed | IsOptimization | IsStopped | IsTesting | IsTradeContextBusy
        | IsVisualMode => bool_reply(false),
        UninitializeReason => int_reply(0),

        // Account
        AccountBalance => double_reply(state.account.balance),
        AccountCredit => double_reply(state.account.credit),
        AccountCompany => string_reply(state.account.company.clone()),
        AccountCurrency => string_reply(state.account.currency.clone()),
        AccountEquity => double_reply(state.equity()),
        AccountFreeMargin => double_reply(state.equity() - state.margin()),
        AccountFreeMarginCheck => {
            let needed = state.margin_for(&text(command, 0), double(command, 2));
            double_reply(state.equity() - state.margin() - needed)
        }
        AccountFreeMarginMode => double_reply(1.0),
        AccountLeverage => int_reply(state.account.leverage),
        AccountMargin => double_reply(state.margin()),
        AccountName => string_reply(state.account.name.clone()),
        AccountNumber => int_reply(state.account.number),
        AccountProfit => double_reply(state.floating_profit()),
        AccountServer => string_reply(state.account.server.clone()),
        AccountStopoutLevel => int_reply(50),
        AccountStopoutMode => int_reply(0),

        // Common
        Alert | Comment | Print => {
            info!("{}: {}", command.operation, text(command, 0));
            None
        }
        PlaySound | SendMail => {
            debug!("{} ignored", command.operation);
            None
        }
        MarketInfo => double_reply(state.market_info(command)),
        MessageBox | MessageBoxA => int_reply(IDOK),
        SendFTP | SendFTPA => bool_reply(state.fail(ERR_INVALID_FUNCTION_PARAMVALUE, false)),

        // Terminal
        TerminalCompany => string_reply("MtApi Simulations Ltd."),
        TerminalName => string_reply("MtApi Simulated Terminal"),
        TerminalPath => string_reply("/opt/mtapi/terminal"),

        // Date and time
        Day | DayOfWeek | DayOfYear | Hour | Minute | Month | Seconds => {
            int_reply(time_part(Utc::now(), command.operation))
        }
        TimeCurrent | TimeLocal => int_reply(now()),
        TimeDay | TimeDayOfWeek | TimeDayOfYear | TimeHour | TimeMinute | TimeMonth
        | TimeSeconds | TimeYear | Year => {
            int_reply(time_part(from_mt_time(int(command, 0)), command.operation))
        }

        // Global variables
        GlobalVariableCheck => bool_reply(state.globals.contains_key(&text(command, 0))),
        GlobalVariableDel => {
            let removed = state.globals.remove(&text(command, 0)).is_some();
            bool_reply(removed)
        }
        GlobalVariableGet => match state.globals.get(&text(command, 0)).map(|(value, _)| *value) {
            Some(value) => double_reply(value),
            None => double_reply(state.fail(ERR_GLOBAL_VARIABLE_NOT_FOUND, 0.0)),
        },
        GlobalVariableName => {
            let name = usize::try_from(int(command, 0))
                .ok()
                .and_then(|i| state.globals.keys().nth(i).cloned());
            match name {
                Some(name) => string_reply(name),
                None => string_reply(state.fail(ERR_INVALID_FUNCTION_PARAMVALUE, String::new())),
            }
        }
        GlobalVariableSet => {
            let time = now();
            state
                .globals
                .insert(text(command, 0), (double(command, 1), time));
            int_reply(time)
        }
        GlobalVariableSetOnCondition => {
            let name = text(command, 0);
            match state.globals.get(&name).map(|(value, _)| *value) {
                Some(current) if current == double(command, 2) => {
                    state.globals.insert(name, (double(command, 1), now()));
                    bool_reply(true)
                }
                Some(_) => bool_reply(false),
                None => bool_reply(state.fail(ERR_GLOBAL_VARIABLE_NOT_FOUND, false)),
            }
        }
        GlobalVariablesDeleteAll => {
            let prefix = text(command, 0);
            let before = state.globals.len();
            state.globals.retain(|name, _| !name.starts_with(&prefix));
            int_reply((before - state.globals.len()) as i32)
        }
        GlobalVariablesTotal => int_reply(state.globals.len() as i32),

        // Timeseries
        iBars => match state.bars(command) {
            Some(_) => int_reply(BARS as i32),
            None => int_reply(0),
        },
        iBarShift => match state.bars(command) {
            Some(bars) => int_reply(bars.shift_of(int(command, 2), flag(command, 3))),
            None => int_reply(-1),
        },
        iClose | iHigh | iLow | iOpen | iVolume => {
            let value = state.bars(command).zip(shift_index(command, 2)).map(|(bars, shift)| {
                match command.operation {
                    iClose => bars.close(shift),
                    iHigh => bars.high(shift),
                    iLow => bars.low(shift),
                    iOpen => bars.open(shift),
                    _ => bars.volume(shift),
                }
            });
            double_reply(value.unwrap_or_default())
        }
        iTime => {
            let value = state
                .bars(command)
                .zip(shift_index(command, 2))
                .map(|(bars, shift)| bars.time(shift));
            int_reply(value.unwrap_or_default())
        }
        iHighest | iLowest => {
            let Some(bars) = state.bars(command) else {
                return int_reply(-1);
            };
            let mode = int(command, 2);
            let start = usize::try_from(int(command, 4)).unwrap_or_default().min(BARS - 1);
            let count = match usize::try_from(int(command, 3)) {
                Ok(0) | Err(_) => BARS - start,
                Ok(count) => count.min(BARS - start),
            };
            let values = (start..start + count).map(|shift| (shift, bars.series(mode, shift)));
            let best = if command.operation == iHighest {
                values.max_by(|a, b| a.1.total_cmp(&b.1))
            } else {
                values.min_by(|a, b| a.1.total_cmp(&b.1))
            };
            int_reply(best.map(|(shift, _)| shift as i32).unwrap_or(-1))
        }
        iCloseArray | iHighArray | iLowArray | iOpenArray | iVolumeArray => {
            let values = state.bars(command).map(|bars| match command.operation {
                iCloseArray => bars.collect(Bars::close),
                iHighArray => bars.collect(Bars::high),
                iLowArray => bars.collect(Bars::low),
                iOpenArray => bars.collect(Bars::open),
                _ => bars.collect(Bars::volume),
            });
            Some(ResponseEnvelope::DoubleArray(values.unwrap_or_default()))
        }
        iTimeArray => {
            let times = state
                .bars(command)
                .map(|bars| (0..BARS).map(|shift| bars.time(shift)).collect())
                .unwrap_or_default();
            Some(ResponseEnvelope::IntArray(times))
        }
        RefreshRates => bool_reply(true),

        // Indicators
        iMA => {
            let Some(bars) = state.bars(command) else {
                return double_reply(0.0);
            };
            let period = usize::try_from(int(command, 2)).unwrap_or_default().max(1);
            let shift = usize::try_from(int(command, 6) + int(command, 3)).unwrap_or_default();
            let closes: Vec<f64> = (shift..(shift + period).min(BARS))
                .map(|i| bars.close(i))
                .collect();
            double_reply(simple_average(&closes))
        }
        iMAOnArray => {
            let (array, next) = counted(command, 0);
            let period = usize::try_from(int(command, next + 1)).unwrap_or_default().max(1);
            let shift = usize::try_from(int(command, next + 4)).unwrap_or_default();
            let window: Vec<f64> = array.iter().skip(shift).take(period).copied().collect();
            double_reply(simple_average(&window))
        }
        other => {
            debug!("{} not simulated", other);
            double_reply(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(terminal: &SimulatedTerminal, op: MtCommandType, params: Vec<Value>) -> Option<ResponseEnvelope> {
        terminal.handle(&Command::new(op, params))
    }

    #[test]
    fn market_order_lifecycle() {
        let terminal = SimulatedTerminal::new();
        let ticket = run(
            &terminal,
            MtCommandType::OrderSend,
            vec!["EURUSD".into(), 0.into(), 0.1.into(), 0.0.into(), 3.into()],
        );
        assert_eq!(ticket, Some(ResponseEnvelope::Int(1)));
        assert_eq!(terminal.open_orders(), 1);

        terminal.set_quote(MtQuote {
            instrument: "EURUSD".to_string(),
            bid: 1.1012,
            ask: 1.1014,
        });
        let closed = run(&terminal, MtCommandType::OrderClose, vec![1.into(), 0.1.into(), 0.0.into(), 3.into()]);
        assert_eq!(closed, Some(ResponseEnvelope::Bool(true)));
        // Bought at 1.1002, sold at 1.1012: 10 pips on 0.1 lots.
        assert!((terminal.balance() - 10_010.0).abs() < 1e-6);
        assert_eq!(
            run(&terminal, MtCommandType::OrdersHistoryTotal, vec![]),
            Some(ResponseEnvelope::Int(1))
        );
    }

    #[test]
    fn unknown_symbol_sets_last_error() {
        let terminal = SimulatedTerminal::new();
        let ticket = run(&terminal, MtCommandType::OrderSend, vec!["XAUUSD".into(), 0.into(), 1.0.into()]);
        assert_eq!(ticket, Some(ResponseEnvelope::Int(-1)));
        assert_eq!(
            run(&terminal, MtCommandType::GetLastError, vec![]),
            Some(ResponseEnvelope::Int(ERR_UNKNOWN_SYMBOL))
        );
        assert_eq!(
            run(&terminal, MtCommandType::GetLastError, vec![]),
            Some(ResponseEnvelope::Int(ERR_NO_ERROR))
        );
    }

    #[test]
    fn global_variables() {
        let terminal = SimulatedTerminal::new();
        for name in ["tmp_a", "tmp_b", "keep"] {
            run(&terminal, MtCommandType::GlobalVariableSet, vec![name.into(), 1.5.into()]);
        }
        assert_eq!(
            run(
                &terminal,
                MtCommandType::GlobalVariableSetOnCondition,
                vec!["keep".into(), 2.0.into(), 1.5.into()]
            ),
            Some(ResponseEnvelope::Bool(true))
        );
        assert_eq!(terminal.global_variable("keep"), Some(2.0));
        assert_eq!(
            run(&terminal, MtCommandType::GlobalVariablesDeleteAll, vec!["tmp_".into()]),
            Some(ResponseEnvelope::Int(2))
        );
        assert_eq!(
            run(&terminal, MtCommandType::GlobalVariablesTotal, vec![]),
            Some(ResponseEnvelope::Int(1))
        );
    }

    #[test]
    fn bar_series_agree() {
        let terminal = SimulatedTerminal::new();
        let closes = match run(&terminal, MtCommandType::iCloseArray, vec!["EURUSD".into(), 60.into()]) {
            Some(ResponseEnvelope::DoubleArray(v)) => v,
            other => panic!("unexpected reply {:?}", other),
        };
        assert_eq!(closes.len(), BARS);
        assert_eq!(
            run(&terminal, MtCommandType::iClose, vec!["EURUSD".into(), 60.into(), 5.into()]),
            Some(ResponseEnvelope::Double(closes[5]))
        );

        let times = match run(&terminal, MtCommandType::iTimeArray, vec!["EURUSD".into(), 60.into()]) {
            Some(ResponseEnvelope::IntArray(v)) => v,
            other => panic!("unexpected reply {:?}", other),
        };
        assert_eq!(times[0] - times[1], 3600);
        assert_eq!(
            run(&terminal, MtCommandType::iBarShift, vec!["EURUSD".into(), 60.into(), times[7].into(), true.into()]),
            Some(ResponseEnvelope::Int(7))
        );
        assert_eq!(
            run(&terminal, MtCommandType::iBarShift, vec!["EURUSD".into(), 60.into(), (times[7] + 1).into(), true.into()]),
            Some(ResponseEnvelope::Int(-1))
        );
    }

    #[test]
    fn moving_average_over_array() {
        let terminal = SimulatedTerminal::new();
        let reply = run(
            &terminal,
            MtCommandType::iMAOnArray,
            vec![
                4.into(),
                1.0.into(),
                2.0.into(),
                3.0.into(),
                4.0.into(),
                4.into(),
                2.into(),
                0.into(),
                0.into(),
                1.into(),
            ],
        );
        assert_eq!(reply, Some(ResponseEnvelope::Double(2.5)));
    }
}
