//! Terminal global variables.
use chrono::{DateTime, Utc};
use mtapi_common::{Command, MtCommandType};

use crate::client::MtApiClient;

impl MtApiClient {
    /// True when the variable exists.
    pub fn global_variable_check(&self, name: &str) -> bool {
        self.invoke(
            Command::builder(MtCommandType::GlobalVariableCheck)
                .arg(name)
                .build(),
        )
    }

    /// Deletes the variable.
    pub fn global_variable_del(&self, name: &str) -> bool {
        self.invoke(
            Command::builder(MtCommandType::GlobalVariableDel)
                .arg(name)
                .build(),
        )
    }

    /// Value of the variable.
    pub fn global_variable_get(&self, name: &str) -> f64 {
        self.invoke(
            Command::builder(MtCommandType::GlobalVariableGet)
                .arg(name)
                .build(),
        )
    }

    /// Name of the variable at `index`.
    pub fn global_variable_name(&self, index: i32) -> String {
        self.invoke(
            Command::builder(MtCommandType::GlobalVariableName)
                .arg(index)
                .build(),
        )
    }

    /// Sets the variable; returns the time of the last access.
    pub fn global_variable_set(&self, name: &str, value: f64) -> DateTime<Utc> {
        self.invoke(
            Command::builder(MtCommandType::GlobalVariableSet)
                .arg(name)
                .arg(value)
                .build(),
        )
    }

    /// Sets the variable to `value` only if it currently equals `check_value`.
    pub fn global_variable_set_on_condition(&self, name: &str, value: f64, check_value: f64) -> bool {
        self.invoke(
            Command::builder(MtCommandType::GlobalVariableSetOnCondition)
                .arg(name)
                .arg(value)
                .arg(check_value)
                .build(),
        )
    }

    /// Deletes every variable whose name starts with `prefix`; returns the count deleted.
    pub fn global_variables_delete_all(&self, prefix: &str) -> i32 {
        self.invoke(
            Command::builder(MtCommandType::GlobalVariablesDeleteAll)
                .arg(prefix)
                .build(),
        )
    }

    /// Number of global variables.
    pub fn global_variables_total(&self) -> i32 {
        self.invoke(Command::bare(MtCommandType::GlobalVariablesTotal))
    }
}
