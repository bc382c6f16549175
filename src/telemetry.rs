// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Structured logging setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, DEFAULT_LOG_FILTER};

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => subscriber
            .with(fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Pretty => subscriber
            .with(fmt::layer().pretty().with_target(true))
            .init(),
    }
}
