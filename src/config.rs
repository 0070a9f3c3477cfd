//! Client configuration and its builder.
//!
//! [`TailClientBuilder`] validates user supplied values before producing a
//! [`TailConfig`]; [`LogTailClient`](crate::LogTailClient) never sees an
//! invalid configuration.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use crate::buffer::DEFAULT_BUFFER_CAPACITY;
use crate::channel::PushChannel;
use crate::client::LogTailClient;
use crate::dispatch::TailObserver;
use crate::error::BuildError;
use crate::rate_limited_warner::DEFAULT_WARN_INTERVAL;

/// Subscription group requested from the server.
pub const DEFAULT_SUBSCRIPTION_ID: &str = "MyGroup";
/// Upper bound (exclusive) of the reconnect jitter window.
pub const DEFAULT_RECONNECT_MAX_DELAY: Duration = Duration::from_secs(5);
/// Default bounded queue capacity between transports and the worker.
pub const DEFAULT_COMMAND_CAPACITY: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TailConfig {
    pub capacity: NonZeroUsize,
    pub subscription_id: String,
    pub reconnect_max_delay: Duration,
    pub command_capacity: usize,
    pub warn_interval: Duration,
    /// Seed for the reconnect jitter; random when `None`.
    pub jitter_seed: Option<u64>,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BUFFER_CAPACITY,
            subscription_id: DEFAULT_SUBSCRIPTION_ID.to_owned(),
            reconnect_max_delay: DEFAULT_RECONNECT_MAX_DELAY,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            warn_interval: DEFAULT_WARN_INTERVAL,
            jitter_seed: None,
        }
    }
}

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(BuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for [`LogTailClient`] instances.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TailClientBuilder {
    capacity: Option<usize>,
    subscription_id: Option<String>,
    reconnect_max_delay_ms: Option<u64>,
    command_capacity: Option<usize>,
    warn_interval_ms: Option<u64>,
    jitter_seed: Option<u64>,
}

impl TailClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    option_setter!(
        #[doc = "Set the maximum number of retained entries."]
        with_capacity,
        capacity,
        usize
    );
    option_setter!(
        #[doc = "Set the subscription group sent with every subscribe request."]
        with_subscription_id,
        subscription_id,
        String
    );
    option_setter!(
        #[doc = "Set the exclusive upper bound of the reconnect delay."]
        with_reconnect_max_delay_ms,
        reconnect_max_delay_ms,
        u64
    );
    option_setter!(with_command_capacity, command_capacity, usize);
    option_setter!(with_warn_interval_ms, warn_interval_ms, u64);
    option_setter!(
        #[doc = "Seed the reconnect jitter for reproducible delays."]
        with_jitter_seed,
        jitter_seed,
        u64
    );

    fn validate(&self) -> Result<(), BuildError> {
        if let Some(capacity) = self.capacity {
            ensure_positive!(capacity, "capacity")?;
        }
        if let Some(delay) = self.reconnect_max_delay_ms {
            ensure_positive!(delay, "reconnect_max_delay_ms")?;
        }
        if let Some(capacity) = self.command_capacity {
            ensure_positive!(capacity, "command_capacity")?;
        }
        if let Some(interval) = self.warn_interval_ms {
            ensure_positive!(interval, "warn_interval_ms")?;
        }
        if let Some(id) = &self.subscription_id
            && id.trim().is_empty()
        {
            return Err(BuildError::InvalidConfig(
                "subscription_id must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Validate the builder and produce the resulting configuration.
    pub fn build_config(&self) -> Result<TailConfig, BuildError> {
        self.validate()?;
        let mut config = TailConfig::default();
        if let Some(capacity) = self.capacity.and_then(NonZeroUsize::new) {
            config.capacity = capacity;
        }
        if let Some(id) = &self.subscription_id {
            config.subscription_id = id.clone();
        }
        if let Some(delay) = self.reconnect_max_delay_ms {
            config.reconnect_max_delay = Duration::from_millis(delay);
        }
        if let Some(capacity) = self.command_capacity {
            config.command_capacity = capacity;
        }
        if let Some(interval) = self.warn_interval_ms {
            config.warn_interval = Duration::from_millis(interval);
        }
        config.jitter_seed = self.jitter_seed;
        Ok(config)
    }

    /// Build a client over `channel` and start connecting.
    pub fn build<C: PushChannel>(&self, channel: C) -> Result<LogTailClient, BuildError> {
        let config = self.build_config()?;
        Ok(LogTailClient::with_config(channel, config))
    }

    /// Build a client with `observers` registered before it starts.
    pub fn build_observed<C: PushChannel>(
        &self,
        channel: C,
        observers: Vec<Arc<dyn TailObserver>>,
    ) -> Result<LogTailClient, BuildError> {
        let config = self.build_config()?;
        Ok(LogTailClient::start(channel, config, observers))
    }
}
