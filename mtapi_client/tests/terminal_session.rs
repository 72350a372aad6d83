//! End-to-end tests: `MtApiClient` over TCP against a simulated terminal.
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};
use mtapi_client::types::{OrderSelectMode, OrderSelectSource, TradeOperation};
use mtapi_client::{
    ClientConfig, ConnectionEvent, ConnectionState, MtApiClient, MtApiError, MtCommandType,
    OrderSendRequest, ResolveMode, Value,
};
use mtapi_common::MtQuote;
use mtapi_terminal::{MockTerminal, SimulatedTerminal, TerminalConfig};

const WAIT: Duration = Duration::from_secs(5);

fn terminal() -> (MockTerminal, Arc<SimulatedTerminal>) {
    let simulator = Arc::new(SimulatedTerminal::new());
    let terminal = MockTerminal::start(simulator.clone()).unwrap();
    (terminal, simulator)
}

fn watch(client: &MtApiClient) -> Receiver<ConnectionEvent> {
    let (tx, rx) = unbounded();
    client.on_connection_state_changed(move |event| {
        let _ = tx.send(event.clone());
    });
    rx
}

/// Waits for the next notification and checks its state.
fn expect(events: &Receiver<ConnectionEvent>, state: ConnectionState) -> ConnectionEvent {
    let event = events.recv_timeout(WAIT).expect("no state notification");
    assert_eq!(event.state, state, "unexpected event: {}", event);
    event
}

fn connected(terminal: &MockTerminal, config: ClientConfig) -> (MtApiClient, Receiver<ConnectionEvent>) {
    let client = MtApiClient::with_config(config);
    let events = watch(&client);
    client.begin_connect("127.0.0.1", terminal.port());
    expect(&events, ConnectionState::Connecting);
    expect(&events, ConnectionState::Connected);
    (client, events)
}

fn eurusd(bid: f64, ask: f64) -> MtQuote {
    MtQuote {
        instrument: "EURUSD".to_string(),
        bid,
        ask,
    }
}

#[test]
fn connect_command_disconnect() {
    let (terminal, _) = terminal();
    let client = MtApiClient::new();
    let events = watch(&client);

    client.begin_connect("127.0.0.1", terminal.port());
    let connecting = expect(&events, ConnectionState::Connecting);
    assert_eq!(connecting.message, format!("Connecting to 127.0.0.1:{}", terminal.port()));
    let up = expect(&events, ConnectionState::Connected);
    assert_eq!(up.message, format!("Connected to 127.0.0.1:{}", terminal.port()));

    assert!(client.is_connection_active());
    assert_eq!(client.account_balance(), 10_000.0);
    assert_eq!(client.account_currency(), "USD");
    assert!(client.is_connected());

    client.begin_disconnect();
    let down = expect(&events, ConnectionState::Disconnected);
    assert_eq!(down.message, "Disconnected");
    assert_eq!(client.account_balance(), 0.0);
}

#[test]
fn local_connect_names_localhost() {
    let (terminal, _) = terminal();
    let client = MtApiClient::new();
    let events = watch(&client);

    client.begin_connect_local(terminal.port());
    let connecting = expect(&events, ConnectionState::Connecting);
    assert_eq!(connecting.message, format!("Connecting to 'localhost':{}", terminal.port()));
    expect(&events, ConnectionState::Connected);
}

#[test]
fn commands_before_connect_complete_are_refused() {
    let (terminal, _) = terminal();
    let client = MtApiClient::new();

    assert_eq!(client.account_number(), 0);
    let refused = client.execute::<f64>(MtCommandType::AccountBalance, vec![]);
    assert!(refused.unwrap_err().is_channel_unavailable());
    assert!(client.get_quotes().is_empty());

    let events = watch(&client);
    client.begin_connect("127.0.0.1", terminal.port());
    expect(&events, ConnectionState::Connecting);
    expect(&events, ConnectionState::Connected);
    assert_eq!(client.account_number(), 1_000_001);
}

#[test]
fn concurrent_callers_receive_their_own_replies() {
    let (terminal, simulator) = terminal();
    let (client, _events) = connected(&terminal, ClientConfig::default());
    let client = Arc::new(client);

    // A slow call in flight forces replies out of order.
    let sleeper = {
        let client = Arc::clone(&client);
        thread::spawn(move || client.sleep(300))
    };

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                for round in 0..10 {
                    let name = format!("w{}_{}", worker, round);
                    let value = f64::from(worker * 100 + round);
                    client.global_variable_set(&name, value);
                    assert_eq!(client.global_variable_get(&name), value);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
    sleeper.join().unwrap();
    assert_eq!(client.global_variables_total(), 80);
    assert_eq!(simulator.global_variable("w7_9"), Some(709.0));
}

#[test]
fn quote_pushes_arrive_in_order() {
    let (terminal, _) = terminal();
    let (client, _events) = connected(&terminal, ClientConfig::default());

    let (tx, rx) = unbounded::<String>();
    {
        let tx = tx.clone();
        client.on_quote_added(move |q| {
            let _ = tx.send(format!("added {} {} {}", q.instrument(), q.bid(), q.ask()));
        });
    }
    {
        let tx = tx.clone();
        client.on_quote_updated(move |symbol, bid, ask| {
            let _ = tx.send(format!("updated {} {} {}", symbol, bid, ask));
        });
    }
    client.on_quote_removed(move |q| {
        let _ = tx.send(format!("removed {}", q.instrument()));
    });

    terminal.push_added(Some(eurusd(1.1000, 1.1002)));
    terminal.push_updated(None);
    terminal.push_updated(Some(eurusd(1.1005, 1.1007)));
    terminal.push_removed(Some(eurusd(1.1005, 1.1007)));

    let received: Vec<String> = (0..3).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
    assert_eq!(
        received,
        vec![
            "added EURUSD 1.1 1.1002".to_string(),
            "updated EURUSD 1.1005 1.1007".to_string(),
            "removed EURUSD".to_string(),
        ]
    );
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn quote_list_round_trips() {
    let (terminal, _) = terminal();
    let (client, _events) = connected(&terminal, ClientConfig::default());

    let quotes = client.get_quotes();
    let symbols: Vec<&str> = quotes.iter().map(|q| q.instrument()).collect();
    assert_eq!(symbols, vec!["EURUSD", "GBPUSD", "USDJPY"]);
    assert_eq!(quotes[0].bid(), 1.1000);
    assert_eq!(quotes[0].ask(), 1.1002);
}

#[test]
fn terminal_goodbye_disconnects_and_reconnect_works() {
    let (terminal, _) = terminal();
    let (client, events) = connected(&terminal, ClientConfig::default());

    terminal.disconnect_all();
    let down = expect(&events, ConnectionState::Disconnected);
    assert_eq!(down.message, "MtApi is disconnected");
    assert!(!client.is_connected());

    client.begin_connect("127.0.0.1", terminal.port());
    expect(&events, ConnectionState::Connecting);
    expect(&events, ConnectionState::Connected);
    assert_eq!(client.account_leverage(), 100);
}

#[test]
fn abrupt_close_disconnects() {
    let (terminal, _) = terminal();
    let (_client, events) = connected(&terminal, ClientConfig::default());

    terminal.abort_all();
    let down = expect(&events, ConnectionState::Disconnected);
    assert_eq!(down.message, "MtApi is disconnected");
}

#[test]
fn undecodable_frame_fails_the_connection() {
    let (terminal, _) = terminal();
    let (client, events) = connected(&terminal, ClientConfig::default());

    terminal.push_raw("this is not a frame");
    let failed = expect(&events, ConnectionState::Failed);
    assert!(failed.message.starts_with("Failed connection with MtApi."));
    assert_eq!(client.connection_state(), ConnectionState::Failed);

    // Failed is not terminal.
    client.begin_connect("127.0.0.1", terminal.port());
    expect(&events, ConnectionState::Connecting);
    expect(&events, ConnectionState::Connected);
}

#[test]
fn connect_to_closed_port_fails() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = MtApiClient::new();
    let events = watch(&client);

    client.begin_connect("127.0.0.1", port);
    expect(&events, ConnectionState::Connecting);
    let failed = expect(&events, ConnectionState::Failed);
    assert!(failed
        .message
        .starts_with(&format!("Failed connection to 127.0.0.1:{}.", port)));
}

#[test]
fn protocol_mismatch_fails_handshake() {
    let simulator = Arc::new(SimulatedTerminal::new());
    let terminal = MockTerminal::bind(
        "127.0.0.1:0",
        simulator,
        TerminalConfig {
            name: "old terminal".to_string(),
            protocol_version: 1,
        },
    )
    .unwrap();
    let client = MtApiClient::new();
    let events = watch(&client);

    client.begin_connect("127.0.0.1", terminal.port());
    expect(&events, ConnectionState::Connecting);
    let failed = expect(&events, ConnectionState::Failed);
    assert!(failed.message.contains("protocol 1"), "{}", failed.message);
}

#[test]
fn command_timeout_releases_the_caller() {
    let (terminal, _) = terminal();
    let config = ClientConfig::default().with_command_timeout(Duration::from_millis(100));
    let (client, _events) = connected(&terminal, config);

    let slow = client.execute::<()>(MtCommandType::Sleep, vec![Value::Int(1_000)]);
    assert!(matches!(slow, Err(MtApiError::Timeout(_))));

    // The channel stays usable and the late reply is discarded.
    assert_eq!(client.account_number(), 1_000_001);
    assert_eq!(client.connection_state(), ConnectionState::Connected);
}

#[test]
fn strict_resolution_reports_shape_mismatch() {
    let (terminal, _) = terminal();
    let strict = ClientConfig::default().with_resolve_mode(ResolveMode::Strict);
    let (client, _events) = connected(&terminal, strict);

    let mismatch = client.execute::<Vec<f64>>(MtCommandType::AccountBalance, vec![]);
    assert!(matches!(mismatch, Err(MtApiError::ResponseMismatch { .. })));
    assert_eq!(
        client.execute::<f64>(MtCommandType::AccountBalance, vec![]).unwrap(),
        10_000.0
    );
    // Shims stay lenient.
    assert!(client
        .send_command::<Vec<f64>>(MtCommandType::AccountBalance, vec![])
        .is_empty());
}

#[test]
fn order_round_trip_through_shims() {
    let (terminal, simulator) = terminal();
    let (client, _events) = connected(&terminal, ClientConfig::default());

    let ticket = client.order_send(
        OrderSendRequest::new("EURUSD", TradeOperation::OP_BUY, 0.1, 0.0, 3, 0.0, 0.0)
            .with_comment("integration")
            .with_magic(7),
    );
    assert_eq!(ticket, 1);
    assert_eq!(client.orders_total(), 1);

    assert!(client.order_select(0, OrderSelectMode::SELECT_BY_POS, OrderSelectSource::MODE_TRADES));
    assert_eq!(client.order_symbol(), "EURUSD");
    assert_eq!(client.order_type(), Some(TradeOperation::OP_BUY));
    assert_eq!(client.order_comment(), "integration");
    assert_eq!(client.order_magic_number(), 7);
    assert_eq!(client.order_open_price(), 1.1002);

    simulator.set_quote(eurusd(1.1012, 1.1014));
    assert!(client.order_close(ticket, 0.1, 1.1012, 3, None));
    assert_eq!(client.orders_total(), 0);
    assert_eq!(client.orders_history_total(), 1);
    assert!((client.account_balance() - 10_010.0).abs() < 1e-6);

    assert_eq!(client.order_send_str("EURUSD", TradeOperation::OP_BUY, 0.1, "bogus", 3, 0.0, 0.0), 0);
    assert_eq!(client.order_send(OrderSendRequest::new("XAUUSD", TradeOperation::OP_BUY, 1.0, 0.0, 3, 0.0, 0.0)), -1);
    assert_eq!(client.get_last_error(), 4106);
    assert_eq!(client.error_description(4106), "unknown symbol");
}
