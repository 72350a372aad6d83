//! Terminal status checks.
use mtapi_common::{Command, MtCommandType};

use crate::client::MtApiClient;

impl MtApiClient {
    getters! {
        /// Last error code reported by the terminal.
        get_last_error => GetLastError: i32;
        /// The terminal's own view of its link to the trade server.
        ///
        /// Unlike `is_connection_active` this is a round trip and
        /// returns `false` when the terminal cannot be reached.
        is_connected => IsConnected: bool;
        /// True on a demo account.
        is_demo => IsDemo: bool;
        /// True when DLL imports are allowed.
        is_dlls_allowed => IsDllsAllowed: bool;
        /// True when experts are enabled.
        is_expert_enabled => IsExpertEnabled: bool;
        /// True when library calls are allowed.
        is_libraries_allowed => IsLibrariesAllowed: bool;
        /// True during strategy optimisation.
        is_optimization => IsOptimization: bool;
        /// True when the expert was asked to stop.
        is_stopped => IsStopped: bool;
        /// True in the strategy tester.
        is_testing => IsTesting: bool;
        /// True when trading is allowed.
        is_trade_allowed => IsTradeAllowed: bool;
        /// True while another expert holds the trade context.
        is_trade_context_busy => IsTradeContextBusy: bool;
        /// True in visual testing mode.
        is_visual_mode => IsVisualMode: bool;
        /// Reason code of the last deinitialisation.
        uninitialize_reason => UninitializeReason: i32;
    }

    /// Text for an error code.
    pub fn error_description(&self, error_code: i32) -> String {
        self.invoke(
            Command::builder(MtCommandType::ErrorDescription)
                .arg(error_code)
                .build(),
        )
    }
}
