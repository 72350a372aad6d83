//! Timeseries access.
use chrono::{DateTime, Utc};
use mtapi_common::command::CommandBuilder;
use mtapi_common::time::to_mt_time;
use mtapi_common::types::{ChartPeriod, SeriesIdentifier};
use mtapi_common::{Command, MtCommandType};

use crate::client::MtApiClient;

fn series(operation: MtCommandType, symbol: &str, timeframe: ChartPeriod) -> CommandBuilder {
    Command::builder(operation)
        .arg(symbol)
        .arg(timeframe as i32)
}

macro_rules! bar_values {
    ($($(#[$meta:meta])* $name:ident => $op:ident : $ty:ty;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self, symbol: &str, timeframe: ChartPeriod, shift: i32) -> $ty {
                self.invoke(series(MtCommandType::$op, symbol, timeframe).arg(shift).build())
            }
        )*
    };
}

macro_rules! whole_series {
    ($($(#[$meta:meta])* $name:ident => $op:ident : $ty:ty;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self, symbol: &str, timeframe: ChartPeriod) -> $ty {
                self.invoke(series(MtCommandType::$op, symbol, timeframe).build())
            }
        )*
    };
}

impl MtApiClient {
    bar_values! {
        /// Close price of the bar `shift` bars back.
        i_close => iClose: f64;
        /// High price of the bar `shift` bars back.
        i_high => iHigh: f64;
        /// Low price of the bar `shift` bars back.
        i_low => iLow: f64;
        /// Open price of the bar `shift` bars back.
        i_open => iOpen: f64;
        /// Open time of the bar `shift` bars back.
        i_time => iTime: DateTime<Utc>;
        /// Tick volume of the bar `shift` bars back.
        i_volume => iVolume: f64;
    }

    whole_series! {
        /// Number of bars on the chart.
        i_bars => iBars: i32;
        /// Close prices of every bar.
        i_close_array => iCloseArray: Vec<f64>;
        /// High prices of every bar.
        i_high_array => iHighArray: Vec<f64>;
        /// Low prices of every bar.
        i_low_array => iLowArray: Vec<f64>;
        /// Open prices of every bar.
        i_open_array => iOpenArray: Vec<f64>;
        /// Tick volumes of every bar.
        i_volume_array => iVolumeArray: Vec<f64>;
        /// Open times of every bar.
        i_time_array => iTimeArray: Vec<DateTime<Utc>>;
    }

    /// Index of the bar containing `time`. With `exact`, -1 when no bar opens at `time`.
    pub fn i_bar_shift(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        time: DateTime<Utc>,
        exact: bool,
    ) -> i32 {
        self.invoke(
            series(MtCommandType::iBarShift, symbol, timeframe)
                .arg(to_mt_time(time))
                .arg(exact)
                .build(),
        )
    }

    /// Index of the highest `series` value over `count` bars from `start`.
    pub fn i_highest(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        series_type: SeriesIdentifier,
        count: i32,
        start: i32,
    ) -> i32 {
        self.invoke(
            series(MtCommandType::iHighest, symbol, timeframe)
                .arg(series_type as i32)
                .arg(count)
                .arg(start)
                .build(),
        )
    }

    /// Index of the lowest `series` value over `count` bars from `start`.
    pub fn i_lowest(
        &self,
        symbol: &str,
        timeframe: ChartPeriod,
        series_type: SeriesIdentifier,
        count: i32,
        start: i32,
    ) -> i32 {
        self.invoke(
            series(MtCommandType::iLowest, symbol, timeframe)
                .arg(series_type as i32)
                .arg(count)
                .arg(start)
                .build(),
        )
    }

    /// Refreshes the terminal's cached rates.
    pub fn refresh_rates(&self) -> bool {
        self.invoke(Command::bare(MtCommandType::RefreshRates))
    }
}
