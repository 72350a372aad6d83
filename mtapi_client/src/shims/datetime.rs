//! Date and time functions.
//!
//! Times cross the wire as whole seconds since the Unix epoch.
use chrono::{DateTime, Utc};
use mtapi_common::time::to_mt_time;
use mtapi_common::{Command, MtCommandType};

use crate::client::MtApiClient;

macro_rules! time_parts {
    ($($(#[$meta:meta])* $name:ident => $op:ident;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self, time: DateTime<Utc>) -> i32 {
                self.invoke(
                    Command::builder(MtCommandType::$op)
                        .arg(to_mt_time(time))
                        .build(),
                )
            }
        )*
    };
}

impl MtApiClient {
    getters! {
        /// Day of month of the last known server time.
        day => Day: i32;
        /// Day of week of the last known server time, 0 is Sunday.
        day_of_week => DayOfWeek: i32;
        /// Day of year of the last known server time.
        day_of_year => DayOfYear: i32;
        /// Hour of the last known server time.
        hour => Hour: i32;
        /// Minute of the last known server time.
        minute => Minute: i32;
        /// Month of the last known server time.
        month => Month: i32;
        /// Seconds of the last known server time.
        seconds => Seconds: i32;
        /// Last known server time.
        time_current => TimeCurrent: DateTime<Utc>;
        /// Local time of the terminal's host.
        time_local => TimeLocal: DateTime<Utc>;
    }

    time_parts! {
        /// Day of month of `time`.
        time_day => TimeDay;
        /// Day of week of `time`.
        time_day_of_week => TimeDayOfWeek;
        /// Day of year of `time`.
        time_day_of_year => TimeDayOfYear;
        /// Hour of `time`.
        time_hour => TimeHour;
        /// Minute of `time`.
        time_minute => TimeMinute;
        /// Month of `time`.
        time_month => TimeMonth;
        /// Seconds of `time`.
        time_seconds => TimeSeconds;
        /// Year of `time`.
        time_year => TimeYear;
        /// Year of `time`.
        year => Year;
    }
}
