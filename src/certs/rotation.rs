use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::certificate::{CertKind, Certificate, CertificateSet};
use crate::error::{Result, ScheduleError};
use crate::models::ScheduleConfig;

/// One certificate reissued during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationEvent {
    pub kind: CertKind,
    pub rotated_at: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    /// Expiry was capped to the CA's lifetime minus the clamp margin
    pub clamped: bool,
    /// Next renewal, CA rotations only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_rotation: Option<DateTime<Utc>>,
}

/// Everything that happened at one simulated cron tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    /// 1-based cron counter
    pub cron: usize,
    pub at: DateTime<Utc>,
    pub rotations: Vec<RotationEvent>,
    /// State after this tick's rotations
    #[serde(skip)]
    pub certificates: CertificateSet,
}

impl TickReport {
    pub fn rotated(&self, kind: CertKind) -> Option<&RotationEvent> {
        self.rotations.iter().find(|r| r.kind == kind)
    }
}

/// Replays a validated schedule against simulated cron ticks spaced
/// `min_cert_duration` apart.
#[derive(Debug, Clone)]
pub struct RotationSimulator {
    config: ScheduleConfig,
    start: DateTime<Utc>,
    initial: CertificateSet,
}

impl RotationSimulator {
    /// Validate `config` and issue all three certificates at `start`.
    pub fn new(config: ScheduleConfig, start: DateTime<Utc>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            start,
            initial: CertificateSet::issue(&config, start)?,
        })
    }

    /// Reject runs whose ticks or reissued leases would end past the latest
    /// date chrono can represent.
    pub fn check_horizon(&self, iterations: usize) -> Result<()> {
        let config = &self.config;
        let longest = [
            config.ca_duration,
            config.ca_rotation_interval(),
            config.node_duration,
            config.client_duration,
        ]
        .into_iter()
        .max()
        .unwrap_or_else(Duration::zero);

        // Last tick, its look-ahead, then the longest lease issued on it.
        // One extra second absorbs dropped sub-second parts.
        let span = (iterations as i128 + 1) * i128::from(config.min_cert_duration.num_seconds())
            + i128::from(longest.num_seconds())
            + 1;

        i64::try_from(span)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|span| self.start.checked_add_signed(span))
            .map(|_| ())
            .ok_or_else(|| ScheduleError::DateOverflow(format!("a {}-tick simulation", iterations)))
    }

    /// Replace the freshly issued certificates, e.g. to start from a CA that
    /// is close to expiry.
    pub fn with_certificates(mut self, certificates: CertificateSet) -> Self {
        self.initial = certificates;
        self
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn initial_certificates(&self) -> &CertificateSet {
        &self.initial
    }

    /// A fresh run of `iterations` ticks. Every call starts over from the
    /// initial certificates.
    ///
    /// The run ends early, without a report for that tick, if a tick or CA
    /// lease would pass the latest representable date; `check_horizon`
    /// rules that out up front.
    pub fn ticks(&self, iterations: usize) -> Ticks {
        Ticks {
            config: self.config,
            certificates: self.initial,
            next_tick: self.start.checked_add_signed(self.config.min_cert_duration),
            cron: 0,
            remaining: iterations,
        }
    }
}

/// Iterator over the ticks of one simulation run.
#[derive(Debug, Clone)]
pub struct Ticks {
    config: ScheduleConfig,
    certificates: CertificateSet,
    next_tick: Option<DateTime<Utc>>,
    cron: usize,
    remaining: usize,
}

impl Ticks {
    pub fn certificates(&self) -> &CertificateSet {
        &self.certificates
    }
}

impl Iterator for Ticks {
    type Item = TickReport;

    fn next(&mut self) -> Option<TickReport> {
        if self.remaining == 0 {
            return None;
        }
        let Some(tick) = self.next_tick else {
            self.remaining = 0;
            return None;
        };

        let interval = self.config.min_cert_duration;
        let mut certificates = self.certificates;
        let mut rotations = Vec::new();

        // Client and node are capped by the CA lease that is active before
        // this tick's own CA rotation, so the CA must go last.
        let ca_valid_to = certificates.ca.valid_to;
        rotations.extend(rotate_leaf(
            CertKind::Client,
            &mut certificates.client,
            tick,
            interval,
            ca_valid_to,
        ));
        rotations.extend(rotate_leaf(
            CertKind::Node,
            &mut certificates.node,
            tick,
            interval,
            ca_valid_to,
        ));

        let ca = &mut certificates.ca;
        if ca.is_due(tick, interval) {
            debug!(cron = self.cron + 1, "CA rotation due at {}", tick);
            if ca.rotate_root(tick, self.config.ca_rotation_interval()).is_none() {
                warn!("CA lease reissued at {} ends past the latest representable date", tick);
                self.remaining = 0;
                return None;
            }
            rotations.push(RotationEvent {
                kind: CertKind::Ca,
                rotated_at: tick,
                valid_to: ca.valid_to,
                clamped: false,
                next_rotation: ca.next_rotation,
            });
        }

        self.certificates = certificates;
        self.next_tick = tick.checked_add_signed(interval);
        self.remaining -= 1;
        self.cron += 1;

        Some(TickReport {
            cron: self.cron,
            at: tick,
            rotations,
            certificates,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

fn rotate_leaf(
    kind: CertKind,
    cert: &mut Certificate,
    tick: DateTime<Utc>,
    interval: Duration,
    ca_valid_to: DateTime<Utc>,
) -> Option<RotationEvent> {
    if !cert.is_due(tick, interval) {
        return None;
    }

    debug!("{} rotation due at {}", kind, tick);
    let clamped = cert.rotate_capped(tick, ca_valid_to);
    if clamped {
        debug!("{} certificate capped to CA expiry {}", kind, ca_valid_to);
    }

    Some(RotationEvent {
        kind,
        rotated_at: tick,
        valid_to: cert.valid_to,
        clamped,
        next_rotation: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn simulator() -> RotationSimulator {
        RotationSimulator::new(ScheduleConfig::default(), start()).unwrap()
    }

    #[test]
    fn test_invalid_config_never_simulates() {
        let config = ScheduleConfig {
            client_duration: Duration::days(20),
            ..ScheduleConfig::default()
        };
        assert!(matches!(
            RotationSimulator::new(config, start()),
            Err(ScheduleError::ClientLifetimeTooShort { .. })
        ));
    }

    #[test]
    fn test_ticks_are_spaced_by_interval() {
        let reports: Vec<_> = simulator().ticks(3).collect();
        assert_eq!(reports.len(), 3);
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.cron, i + 1);
            assert_eq!(report.at, start() + Duration::days(27 * (i as i64 + 1)));
        }
    }

    #[test]
    fn test_client_due_on_first_tick() {
        let report = simulator().ticks(1).next().unwrap();
        let client = report.rotated(CertKind::Client).unwrap();

        assert_eq!(client.rotated_at, start() + Duration::days(27));
        assert_eq!(client.valid_to, start() + Duration::days(57));
        assert!(!client.clamped);
        assert!(report.rotated(CertKind::Node).is_none());
        assert!(report.rotated(CertKind::Ca).is_none());
    }

    #[test]
    fn test_not_due_certificates_are_untouched() {
        let sim = simulator();
        let before = *sim.initial_certificates();
        let report = sim.ticks(1).next().unwrap();

        assert_eq!(report.certificates.node, before.node);
        assert_eq!(report.certificates.ca, before.ca);
        assert_ne!(report.certificates.client, before.client);
    }

    #[test]
    fn test_clamp_to_near_expiry_ca() {
        let sim = simulator();
        let mut certs = *sim.initial_certificates();
        certs.ca.valid_to = start() + Duration::days(10);
        let sim = sim.with_certificates(certs);

        let report = sim.ticks(1).next().unwrap();
        let client = report.rotated(CertKind::Client).unwrap();
        assert!(client.clamped);
        assert_eq!(
            client.valid_to,
            start() + Duration::days(10) - Duration::hours(1)
        );
        assert_eq!(report.certificates.client.valid_from, report.at);
    }

    #[test]
    fn test_same_tick_clamp_uses_previous_ca() {
        let sim = simulator();
        let mut certs = *sim.initial_certificates();
        certs.ca.valid_to = start() + Duration::days(40);
        certs.ca.next_rotation = Some(start() + Duration::days(30));
        let sim = sim.with_certificates(certs);

        let report = sim.ticks(1).next().unwrap();
        let client = report.rotated(CertKind::Client).unwrap();
        let ca = report.rotated(CertKind::Ca).unwrap();

        assert!(client.clamped);
        assert_eq!(
            client.valid_to,
            start() + Duration::days(40) - Duration::hours(1)
        );
        assert_eq!(ca.valid_to, report.at + Duration::days(1095));
        assert_eq!(ca.next_rotation, Some(report.at + Duration::days(1067)));
    }

    #[test]
    fn test_ca_rotation_moves_its_own_window() {
        let sim = simulator();
        let mut certs = *sim.initial_certificates();
        certs.ca.next_rotation = Some(start() + Duration::days(27));
        let sim = sim.with_certificates(certs);

        let report = sim.ticks(1).next().unwrap();
        assert!(report.rotated(CertKind::Ca).is_some());
        assert_eq!(report.certificates.ca.valid_from, report.at);
        // The client rotated for its own reasons; nothing else touched it.
        assert_eq!(
            report.certificates.client.valid_to,
            report.at + Duration::days(30)
        );
    }

    #[test]
    fn test_ticks_are_restartable() {
        let sim = simulator();
        let first: Vec<_> = sim.ticks(5).map(|r| r.rotations).collect();
        let second: Vec<_> = sim.ticks(5).map(|r| r.rotations).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_size_hint_counts_down() {
        let mut ticks = simulator().ticks(4);
        assert_eq!(ticks.size_hint(), (0, Some(4)));
        ticks.next();
        assert_eq!(ticks.size_hint(), (0, Some(3)));
        assert_eq!(simulator().ticks(0).count(), 0);
    }

    #[test]
    fn test_huge_day_count_is_config_error() {
        let config = ScheduleConfig {
            ca_duration: Duration::days(100_000_000),
            ..ScheduleConfig::default()
        };
        assert!(matches!(
            RotationSimulator::new(config, start()),
            Err(ScheduleError::DateOverflow(_))
        ));
    }

    #[test]
    fn test_horizon_check() {
        let sim = simulator();
        assert!(sim.check_horizon(29).is_ok());
        assert!(sim.check_horizon(10_000).is_ok());
        assert!(matches!(
            sim.check_horizon(4_000_000),
            Err(ScheduleError::DateOverflow(_))
        ));
        assert!(sim.check_horizon(usize::MAX).is_err());
    }

    #[test]
    fn test_run_past_latest_date_stops_cleanly() {
        let mut count = 0;
        for report in simulator().ticks(4_000_000) {
            assert!(report.certificates.within_ca_lifetime());
            count += 1;
        }

        // Roughly 260,000 years of 27-day ticks fit before chrono's limit.
        assert!(count > 1_000_000);
        assert!(count < 4_000_000);
    }
}
