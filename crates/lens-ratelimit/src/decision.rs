//! The outcome of an admission check

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Admitted under the regular per-class limit.
    Allowed { remaining: i64, reset_at: i64 },
    /// Regular limit exhausted, admitted from the burst pool.
    BurstUsed { burst_remaining: i64, reset_at: i64 },
    /// Tenant is flagged bypassed; always admitted, limit reported as the
    /// maximum representable integer.
    Bypassed { effective_limit: i64 },
    /// Neither the regular limit nor the burst pool had room.
    RateLimited { retry_after_secs: i64 },
    /// The substrate failed during the check itself. Fail-open: still
    /// admitted.
    SubstrateError { reason: String },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Decision::RateLimited { .. })
    }
}
