// src/core/ipgate.rs

//! Literal allow/deny-list screening of client addresses.
//!
//! Both lists are flat sets of addresses; range notation is expanded to
//! literals at configuration time, outside this crate. Allow-list
//! membership wins and short-circuits every later check.

use crate::config::IpConfig;
use std::collections::HashSet;
use std::net::IpAddr;

/// The outcome of address screening. `Unknown` falls through to
/// credential-based authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVerdict {
    Allowed,
    Denied,
    Unknown,
}

#[derive(Debug, Default)]
pub struct IpGate {
    allowlist: HashSet<IpAddr>,
    denylist: HashSet<IpAddr>,
}

impl IpGate {
    pub fn new(allowlist: Vec<IpAddr>, denylist: Vec<IpAddr>) -> Self {
        Self {
            allowlist: allowlist.into_iter().collect(),
            denylist: denylist.into_iter().collect(),
        }
    }

    pub fn from_config(config: &IpConfig) -> Self {
        Self::new(config.allowlist.clone(), config.denylist.clone())
    }

    pub fn classify(&self, address: IpAddr) -> IpVerdict {
        if self.allowlist.contains(&address) {
            IpVerdict::Allowed
        } else if self.denylist.contains(&address) {
            IpVerdict::Denied
        } else {
            IpVerdict::Unknown
        }
    }
}
