//! Common terminal functions.
use mtapi_common::types::{MarketInfoModeType, EMPTY};
use mtapi_common::{Command, MtCommandType};

use crate::client::MtApiClient;

impl MtApiClient {
    /// Shows an alert window in the terminal.
    pub fn alert(&self, msg: &str) {
        self.invoke::<()>(Command::builder(MtCommandType::Alert).arg(msg).build())
    }

    /// Sets the chart comment.
    pub fn comment(&self, msg: &str) {
        self.invoke::<()>(Command::builder(MtCommandType::Comment).arg(msg).build())
    }

    /// Milliseconds since the terminal's host started.
    pub fn get_tick_count(&self) -> i32 {
        self.invoke(Command::bare(MtCommandType::GetTickCount))
    }

    /// Instrument property selected by `mode`.
    pub fn market_info(&self, symbol: &str, mode: MarketInfoModeType) -> f64 {
        self.invoke(
            Command::builder(MtCommandType::MarketInfo)
                .arg(symbol)
                .arg(mode as i32)
                .build(),
        )
    }

    /// Shows a message box; returns the pressed button code.
    pub fn message_box(&self, text: &str) -> i32 {
        self.invoke(Command::builder(MtCommandType::MessageBox).arg(text).build())
    }

    /// Shows a message box with a caption and default buttons.
    pub fn message_box_with_caption(&self, text: &str, caption: &str) -> i32 {
        self.message_box_with_flags(text, caption, EMPTY)
    }

    /// Shows a message box with a caption and button flags.
    pub fn message_box_with_flags(&self, text: &str, caption: &str, flags: i32) -> i32 {
        self.invoke(
            Command::builder(MtCommandType::MessageBoxA)
                .arg(text)
                .arg(caption)
                .arg(flags)
                .build(),
        )
    }

    /// Plays a sound file on the terminal host.
    pub fn play_sound(&self, filename: &str) {
        self.invoke::<()>(
            Command::builder(MtCommandType::PlaySound)
                .arg(filename)
                .build(),
        )
    }

    /// Writes to the terminal's expert log.
    pub fn print(&self, msg: &str) {
        self.invoke::<()>(Command::builder(MtCommandType::Print).arg(msg).build())
    }

    /// Uploads a file to the configured FTP server.
    pub fn send_ftp(&self, filename: &str) -> bool {
        self.invoke(Command::builder(MtCommandType::SendFTP).arg(filename).build())
    }

    /// Uploads a file to `ftp_path` on the configured FTP server.
    pub fn send_ftp_to(&self, filename: &str, ftp_path: &str) -> bool {
        self.invoke(
            Command::builder(MtCommandType::SendFTPA)
                .arg(filename)
                .arg(ftp_path)
                .build(),
        )
    }

    /// Sends mail through the terminal's mail settings.
    pub fn send_mail(&self, subject: &str, text: &str) {
        self.invoke::<()>(
            Command::builder(MtCommandType::SendMail)
                .arg(subject)
                .arg(text)
                .build(),
        )
    }

    /// Suspends the terminal-side expert for `milliseconds`.
    pub fn sleep(&self, milliseconds: i32) {
        self.invoke::<()>(
            Command::builder(MtCommandType::Sleep)
                .arg(milliseconds)
                .build(),
        )
    }
}
