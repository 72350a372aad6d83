//! Typed operation shims.
//!
//! Each shim packs a fixed parameter list into a `Command`, dispatches it and
//! converts the reply to a fixed type. Like the terminal's own API they never
//! fail: when the channel is unavailable or the reply has an unexpected
//! shape, the result is the type's default value. Use
//! `MtApiClient::execute` when failures must be distinguishable.

/// Declares parameterless shims as `name => Operation: Type;`.
macro_rules! getters {
    ($($(#[$meta:meta])* $name:ident => $op:ident : $ty:ty;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self) -> $ty {
                self.invoke(mtapi_common::Command::bare(mtapi_common::MtCommandType::$op))
            }
        )*
    };
}

mod account;
mod checkup;
mod common;
mod datetime;
mod global_variables;
mod indicators;
mod terminal;
mod timeseries;
mod trading;

pub use trading::OrderSendRequest;

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    use chrono::{TimeZone, Utc};
    use crossbeam_channel::unbounded;
    use mtapi_common::types::{ChartPeriod, TradeOperation, EMPTY};
    use mtapi_common::{Command, MtCommandType, MtQuote, ResponseEnvelope, Result, Value};

    use crate::client::MtApiClient;
    use crate::config::ClientConfig;
    use crate::connection::ConnectionState;
    use crate::transport::{Endpoint, Transport};

    /// Records every command and answers from a fixed table.
    struct Recording {
        sent: Mutex<Vec<Command>>,
    }

    impl Transport for Recording {
        fn open(&self, _: &Endpoint) -> Result<u64> {
            Ok(1)
        }

        fn close(&self) {}

        fn send_request(&self, command: &Command) -> Result<Option<ResponseEnvelope>> {
            self.sent.lock()?.push(command.clone());
            Ok(match command.operation {
                MtCommandType::AccountBalance => Some(ResponseEnvelope::Double(1500.25)),
                MtCommandType::OrderType => Some(ResponseEnvelope::Int(4)),
                MtCommandType::iTimeArray => Some(ResponseEnvelope::IntArray(vec![0, 60])),
                MtCommandType::GlobalVariablesDeleteAll => Some(ResponseEnvelope::Int(3)),
                _ => None,
            })
        }

        fn get_quotes(&self) -> Result<Vec<MtQuote>> {
            Ok(Vec::new())
        }
    }

    fn client(connect: bool) -> (MtApiClient, Arc<Recording>) {
        let transport = Arc::new(Recording {
            sent: Mutex::new(Vec::new()),
        });
        let (_events_tx, events_rx) = unbounded();
        let client = MtApiClient::with_transport(
            Arc::clone(&transport) as Arc<dyn Transport>,
            events_rx,
            ClientConfig::default(),
        );
        if connect {
            client.begin_connect_local(1);
            let deadline = Instant::now() + Duration::from_secs(5);
            while client.connection_state() != ConnectionState::Connected {
                assert!(Instant::now() < deadline, "client never connected");
                thread::sleep(Duration::from_millis(5));
            }
        }
        (client, transport)
    }

    fn last_sent(transport: &Recording) -> Command {
        transport.sent.lock().unwrap().last().cloned().unwrap()
    }

    #[test]
    fn typed_results() {
        let (client, _) = client(true);
        assert_eq!(client.account_balance(), 1500.25);
        assert_eq!(client.order_type(), Some(TradeOperation::OP_BUYSTOP));
        assert_eq!(
            client.i_time_array("EURUSD", ChartPeriod::PERIOD_M1),
            vec![
                Utc.timestamp_opt(0, 0).unwrap(),
                Utc.timestamp_opt(60, 0).unwrap()
            ]
        );
        // Empty reply for a string shim.
        assert_eq!(client.account_name(), "");
    }

    #[test]
    fn on_array_and_delete_all_use_their_own_operations() {
        let (client, transport) = client(true);

        client.i_rsi_on_array(&[1.0, 2.0, 3.0], 3, 14, 0);
        let command = last_sent(&transport);
        assert_eq!(command.operation, MtCommandType::iRSIOnArray);
        assert_eq!(
            command.parameters,
            vec![
                Value::Int(3),
                Value::Double(1.0),
                Value::Double(2.0),
                Value::Double(3.0),
                Value::Int(3),
                Value::Int(14),
                Value::Int(0),
            ]
        );

        assert_eq!(client.global_variables_delete_all("tmp_"), 3);
        assert_eq!(
            last_sent(&transport).operation,
            MtCommandType::GlobalVariablesDeleteAll
        );
    }

    #[test]
    fn message_box_with_caption_passes_empty_flags() {
        let (client, transport) = client(true);
        client.message_box_with_caption("text", "caption");
        let command = last_sent(&transport);
        assert_eq!(command.operation, MtCommandType::MessageBoxA);
        assert_eq!(command.parameters[2], Value::Int(EMPTY));
    }

    #[test]
    fn unparsable_price_short_circuits() {
        let (client, transport) = client(true);
        let ticket =
            client.order_send_str("EURUSD", TradeOperation::OP_BUY, 1.0, "n/a", 3, 0.0, 0.0);
        assert_eq!(ticket, 0);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn shims_yield_defaults_while_disconnected() {
        let (client, transport) = client(false);
        assert_eq!(client.account_balance(), 0.0);
        assert!(!client.is_connected());
        assert_eq!(client.order_type(), Some(TradeOperation::OP_BUY));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn time_arguments_are_epoch_seconds() {
        let (client, transport) = client(true);
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        client.i_bar_shift("EURUSD", ChartPeriod::PERIOD_H1, time, true);
        let command = last_sent(&transport);
        assert_eq!(command.parameters[1], Value::Int(60));
        assert_eq!(command.parameters[2], Value::Int(time.timestamp() as i32));
        assert_eq!(command.parameters[3], Value::Bool(true));
    }
}
