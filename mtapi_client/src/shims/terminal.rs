//! Terminal identification.
use crate::client::MtApiClient;

impl MtApiClient {
    getters! {
        /// Company owning the terminal.
        terminal_company => TerminalCompany: String;
        /// Terminal name.
        terminal_name => TerminalName: String;
        /// Terminal installation directory.
        terminal_path => TerminalPath: String;
    }
}
