// Licensed to Elasticsearch B.V. under one or more contributor
// license agreements. See the NOTICE file distributed with
// this work for additional information regarding copyright
// ownership. Elasticsearch B.V. licenses this file to you under
// the Apache License, Version 2.0 (the "License"); you may
// not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use inquire::{Password, PasswordDisplayMode};

use crate::error::BeanError;

/// Source of new user passwords.
pub trait PasswordPrompt: Send + Sync {
    fn password(&self, username: &str) -> Result<String, BeanError>;
}

/// Reads a password twice from the terminal, masked.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn password(&self, username: &str) -> Result<String, BeanError> {
        Ok(Password::new(&format!("Password for {username}:"))
            .with_display_mode(PasswordDisplayMode::Masked)
            .with_custom_confirmation_message("Confirm password:")
            .with_custom_confirmation_error_message("two input password must be consistent")
            .with_validator(inquire::required!())
            .prompt()?)
    }
}

/// Always answers with the same password.
#[derive(Debug, Clone)]
pub struct FixedPrompt(pub String);

impl PasswordPrompt for FixedPrompt {
    fn password(&self, _username: &str) -> Result<String, BeanError> {
        Ok(self.0.clone())
    }
}
