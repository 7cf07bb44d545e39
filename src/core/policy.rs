//! Policy Engine - mode-aware recommendation builder
//!
//! Rules fire in strictly descending severity, so the first reason in
//! the output is the one that set the final recommendation. Severity
//! only ever escalates while a request is evaluated. The score is an
//! additive weight total clamped to 0..=100 and carries no control-flow
//! meaning of its own.

use crate::models::{
    AddressIntelHit, AddressLabel, AmountKind, DecodedAction, Mode, Reason, Recommendation,
    SimulationOutcome, SimulationStatus, TrustLevel, TrustVerdict,
};
use crate::utils::{
    RISK_DELTA_WARN_THRESHOLD, WEIGHT_ADDRESS_FLAGGED, WEIGHT_ADDRESS_SANCTIONED,
    WEIGHT_APPROVAL_FOR_ALL, WEIGHT_DOMAIN_BLOCKLIST, WEIGHT_DOMAIN_SUSPICIOUS, WEIGHT_SCAM_TOKEN,
    WEIGHT_SIMULATION_REVERT, WEIGHT_SIMULATION_RISK, WEIGHT_UNLIMITED_APPROVAL,
    WEIGHT_UNLIMITED_PERMIT,
};

// ============================================
// INPUT / OUTPUT
// ============================================

/// Everything the rule table looks at for one request
#[derive(Debug)]
pub struct PolicyInput<'a> {
    pub decoded: Option<&'a DecodedAction>,
    pub trust: &'a TrustVerdict,
    /// Matched blocklist entry for the request host
    pub domain_block_hit: Option<&'a str>,
    /// Counterparty found in the plain blocked-address set
    pub blocked_address_hit: Option<&'a str>,
    /// Labeled counterparties, in lookup order
    pub address_hits: &'a [AddressIntelHit],
    pub scam_token_hit: Option<(u64, &'a str)>,
    pub risk_delta: u8,
    pub simulation: &'a SimulationOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyOutcome {
    pub recommend: Recommendation,
    pub score: u8,
    pub reasons: Vec<Reason>,
}

// ============================================
// SEVERITY TALLY
// ============================================

/// Escalate-only accumulator. `hit` can raise the recommendation,
/// never lower it, and appends the reason in firing order.
#[derive(Debug)]
struct Tally {
    recommend: Recommendation,
    score: u32,
    reasons: Vec<Reason>,
}

impl Tally {
    fn new() -> Self {
        Self {
            recommend: Recommendation::Allow,
            score: 0,
            reasons: Vec::new(),
        }
    }

    fn hit(&mut self, level: Recommendation, weight: u8, reason: Reason) {
        if (level as u8) > (self.recommend as u8) {
            self.recommend = level;
        }
        self.score += weight as u32;
        self.reasons.push(reason);
    }

    fn finish(self) -> PolicyOutcome {
        PolicyOutcome {
            recommend: self.recommend,
            score: self.score.min(100) as u8,
            reasons: self.reasons,
        }
    }
}

// ============================================
// RULE TABLE
// ============================================

/// Run the rule table over one request's signals.
///
/// OFF is a true kill switch: nothing past it runs, even hard intel.
/// In every active mode the hard-intel rules produce BLOCK outright;
/// the dangerous-approval rules escalate to BLOCK under STRICT and
/// HIGH otherwise; the soft domain and simulation signals cap at WARN.
pub fn apply(input: &PolicyInput<'_>, mode: Mode) -> PolicyOutcome {
    let mut tally = Tally::new();

    if mode == Mode::Off {
        tally.hit(Recommendation::Allow, 0, Reason::ProtectionOff);
        return tally.finish();
    }

    // Hard intel: known-bad in every active mode
    if let Some(host) = input.domain_block_hit {
        tally.hit(
            Recommendation::Block,
            WEIGHT_DOMAIN_BLOCKLIST,
            Reason::DomainBlocklisted {
                host: host.to_string(),
            },
        );
    }
    if let Some(hit) = input.address_hits.iter().find(|h| h.is_sanctioned()) {
        tally.hit(
            Recommendation::Block,
            WEIGHT_ADDRESS_SANCTIONED,
            Reason::AddressSanctioned {
                address: hit.address.clone(),
            },
        );
    }

    // Dangerous approvals and flagged counterparties scale with mode
    let escalated = match mode {
        Mode::Strict => Recommendation::Block,
        _ => Recommendation::High,
    };

    match input.decoded {
        Some(DecodedAction::ApproveErc20 {
            token,
            spender,
            amount_kind: AmountKind::Unlimited,
            ..
        }) => {
            tally.hit(
                escalated,
                WEIGHT_UNLIMITED_APPROVAL,
                Reason::UnlimitedApproval {
                    token: token.clone(),
                    spender: spender.clone(),
                },
            );
        }
        Some(DecodedAction::SetApprovalForAll {
            token,
            operator,
            approved: true,
        }) => {
            tally.hit(
                escalated,
                WEIGHT_APPROVAL_FOR_ALL,
                Reason::ApprovalForAll {
                    token: token.clone(),
                    operator: operator.clone(),
                },
            );
        }
        Some(DecodedAction::PermitEip2612 {
            token,
            spender,
            value_kind: AmountKind::Unlimited,
            ..
        }) => {
            tally.hit(
                escalated,
                WEIGHT_UNLIMITED_PERMIT,
                Reason::UnlimitedPermit {
                    token: token.clone(),
                    spender: spender.clone(),
                },
            );
        }
        _ => {}
    }

    if let Some((address, label)) = first_flagged(input) {
        tally.hit(
            escalated,
            WEIGHT_ADDRESS_FLAGGED,
            Reason::AddressFlagged { address, label },
        );
    }

    if let Some((chain_id, address)) = input.scam_token_hit {
        tally.hit(
            escalated,
            WEIGHT_SCAM_TOKEN,
            Reason::ScamToken {
                chain_id,
                address: address.to_string(),
            },
        );
    }

    // Simulation signals
    match input.simulation.status {
        SimulationStatus::Risk => {
            tally.hit(
                Recommendation::High,
                WEIGHT_SIMULATION_RISK,
                Reason::SimulationRisk,
            );
        }
        SimulationStatus::Revert => {
            tally.hit(
                Recommendation::Warn,
                WEIGHT_SIMULATION_REVERT,
                Reason::SimulationRevert,
            );
        }
        SimulationStatus::Success | SimulationStatus::Skipped => {}
    }

    // Soft domain signals, WARN tier
    if input.trust.level == TrustLevel::Suspicious {
        tally.hit(
            Recommendation::Warn,
            WEIGHT_DOMAIN_SUSPICIOUS,
            Reason::DomainSuspicious {
                score: input.trust.score,
            },
        );
    }
    if input.risk_delta >= RISK_DELTA_WARN_THRESHOLD {
        tally.hit(
            Recommendation::Warn,
            input.risk_delta,
            Reason::DomainRiskElevated {
                delta: input.risk_delta,
            },
        );
    }

    tally.finish()
}

/// First non-sanctioned flagged counterparty with its leading label.
/// Sanctioned addresses are the hard-intel rule's business, not this
/// one's. Falls back to the plain blocked-address set, reported as
/// SCAM_REPORTED.
fn first_flagged(input: &PolicyInput<'_>) -> Option<(String, AddressLabel)> {
    for hit in input.address_hits {
        if hit.is_sanctioned() {
            continue;
        }
        if let Some(label) = hit.labels.first() {
            return Some((hit.address.clone(), *label));
        }
    }
    input
        .blocked_address_hit
        .map(|addr| (addr.to_string(), AddressLabel::ScamReported))
}
