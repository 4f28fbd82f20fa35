//! config — ambient tunables for opening/creating/closing a relation.
//!
//! This engine has no transactions, crash recovery, or concurrency to
//! configure, but it still has a handful of things worth making
//! tunable rather than hardwired: the tuple-size ceiling and whether
//! closing a relation fsyncs its files.

use std::fmt;

/// Top-level configuration for opening/creating a relation.
#[derive(Clone, Debug)]
pub struct MalhConfig {
    /// Ceiling on an encoded tuple's length (incl. terminating NUL).
    /// Env: MALH_MAX_TUPLE_LEN (default `consts::MAXTUPLEN`).
    pub max_tuple_len: usize,

    /// Whether `Relation::close` fsyncs the three files after the
    /// final meta write.
    /// Env: MALH_FSYNC_ON_CLOSE (default true; "0|false|off|no" => false)
    pub fsync_on_close: bool,
}

impl Default for MalhConfig {
    fn default() -> Self {
        Self {
            max_tuple_len: crate::consts::MAXTUPLEN,
            fsync_on_close: true,
        }
    }
}

impl MalhConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("MALH_MAX_TUPLE_LEN") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.max_tuple_len = n;
            }
        }

        if let Ok(v) = std::env::var("MALH_FSYNC_ON_CLOSE") {
            let s = v.trim().to_ascii_lowercase();
            cfg.fsync_on_close = !(s == "0" || s == "false" || s == "off" || s == "no");
        }

        cfg
    }

    pub fn with_max_tuple_len(mut self, len: usize) -> Self {
        self.max_tuple_len = len;
        self
    }

    pub fn with_fsync_on_close(mut self, on: bool) -> Self {
        self.fsync_on_close = on;
        self
    }
}

impl fmt::Display for MalhConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MalhConfig {{ max_tuple_len: {}, fsync_on_close: {} }}",
            self.max_tuple_len, self.fsync_on_close
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = MalhConfig::default();
        assert_eq!(cfg.max_tuple_len, crate::consts::MAXTUPLEN);
        assert!(cfg.fsync_on_close);
    }

    #[test]
    fn builder_overrides() {
        let cfg = MalhConfig::default().with_max_tuple_len(128).with_fsync_on_close(false);
        assert_eq!(cfg.max_tuple_len, 128);
        assert!(!cfg.fsync_on_close);
    }
}
