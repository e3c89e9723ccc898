// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use thiserror::Error;

/// Failures talking to the radio-mode authority.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RadioError {
    #[error("radio-mode authority rejected the request: {0}")]
    Rejected(String),
    #[error("radio-mode authority unavailable")]
    Unavailable,
}

/// Failures producing a concrete soft AP configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no usable channel for the requested band")]
    NoChannel,
    #[error("invalid soft AP configuration: {0}")]
    Invalid(String),
}

/// Failure attaching a death notification to a client link.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    #[error("client link already closed")]
    Closed,
}

/// Failures of the request/response hand-off with the worker thread.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ServiceError {
    #[error("timed out waiting for the hotspot worker")]
    Timeout,
    #[error("hotspot worker is gone")]
    WorkerGone,
    #[error("client link already closed")]
    LinkClosed,
}

impl From<LinkError> for ServiceError {
    fn from(_: LinkError) -> Self {
        ServiceError::LinkClosed
    }
}
