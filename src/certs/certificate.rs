use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ScheduleError};
use crate::models::ScheduleConfig;

/// Gap kept between a capped certificate's expiry and its CA's expiry.
pub const CLAMP_MARGIN_HOURS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertKind {
    Ca,
    Node,
    Client,
}

impl fmt::Display for CertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertKind::Ca => write!(f, "CA"),
            CertKind::Node => write!(f, "node"),
            CertKind::Client => write!(f, "client"),
        }
    }
}

/// One simulated certificate lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Certificate {
    /// Validity span given on every (re)issue
    pub duration: Duration,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    /// When the CA's own renewal is due. Always `None` for leaf certificates.
    pub next_rotation: Option<DateTime<Utc>>,
}

impl Certificate {
    /// `None` when the lease would end past the latest representable date.
    pub fn issue(duration: Duration, now: DateTime<Utc>) -> Option<Self> {
        Some(Self {
            duration,
            valid_from: now,
            valid_to: now.checked_add_signed(duration)?,
            next_rotation: None,
        })
    }

    /// Issue a CA certificate whose renewal falls `rotation_interval` from now.
    pub fn issue_ca(
        duration: Duration,
        rotation_interval: Duration,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        Some(Self {
            next_rotation: Some(now.checked_add_signed(rotation_interval)?),
            ..Self::issue(duration, now)?
        })
    }

    /// The instant whose arrival triggers a rotation: the renewal time for a
    /// CA, the hard expiry otherwise.
    pub fn rotation_deadline(&self) -> DateTime<Utc> {
        self.next_rotation.unwrap_or(self.valid_to)
    }

    /// Due when the deadline falls at or before the next tick, so the
    /// rotation completes before the certificate actually lapses.
    pub fn is_due(&self, tick: DateTime<Utc>, interval: Duration) -> bool {
        match tick.checked_add_signed(interval) {
            Some(next_tick) => self.rotation_deadline() <= next_tick,
            // The next tick lies beyond every representable deadline.
            None => true,
        }
    }

    /// Reissue at `tick`, never extending past `ceiling`.
    ///
    /// Returns `true` when the new expiry had to be capped.
    pub fn rotate_capped(&mut self, tick: DateTime<Utc>, ceiling: DateTime<Utc>) -> bool {
        let candidate = tick
            .checked_add_signed(self.duration)
            .filter(|candidate| *candidate <= ceiling);

        let clamped = candidate.is_none();
        self.valid_to = candidate.unwrap_or_else(|| {
            ceiling
                .checked_sub_signed(Duration::hours(CLAMP_MARGIN_HOURS))
                .unwrap_or(ceiling)
        });
        self.valid_from = tick;

        clamped
    }

    /// Reissue a root certificate at `tick` and schedule its next renewal.
    /// Moves the CA's own `valid_from`; older tooling left it at first issue.
    ///
    /// Returns `None`, leaving the lease untouched, when the new window ends
    /// past the latest representable date.
    pub fn rotate_root(&mut self, tick: DateTime<Utc>, rotation_interval: Duration) -> Option<()> {
        let valid_to = tick.checked_add_signed(self.duration)?;
        let next_rotation = tick.checked_add_signed(rotation_interval)?;

        self.valid_from = tick;
        self.valid_to = valid_to;
        self.next_rotation = Some(next_rotation);
        Some(())
    }
}

/// The three live certificates of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateSet {
    pub ca: Certificate,
    pub node: Certificate,
    pub client: Certificate,
}

impl CertificateSet {
    pub fn issue(config: &ScheduleConfig, now: DateTime<Utc>) -> Result<Self> {
        let overflow = |field: &str| ScheduleError::DateOverflow(format!("{} from now", field));

        Ok(Self {
            ca: Certificate::issue_ca(config.ca_duration, config.ca_rotation_interval(), now)
                .ok_or_else(|| overflow("ca-duration"))?,
            node: Certificate::issue(config.node_duration, now)
                .ok_or_else(|| overflow("node-duration"))?,
            client: Certificate::issue(config.client_duration, now)
                .ok_or_else(|| overflow("client-duration"))?,
        })
    }

    pub fn get(&self, kind: CertKind) -> &Certificate {
        match kind {
            CertKind::Ca => &self.ca,
            CertKind::Node => &self.node,
            CertKind::Client => &self.client,
        }
    }

    /// Node and client leases end no later than the CA lease.
    pub fn within_ca_lifetime(&self) -> bool {
        self.node.valid_to <= self.ca.valid_to && self.client.valid_to <= self.ca.valid_to
    }
}
