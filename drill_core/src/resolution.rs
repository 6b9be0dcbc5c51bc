use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

use crate::catalog::FaultKind;

/// Command-palette grouping for remedial actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionCategory {
    Network,
    OnChain,
    Lightning,
}

impl ActionCategory {
    pub const ALL: [ActionCategory; 3] = [
        ActionCategory::Network,
        ActionCategory::OnChain,
        ActionCategory::Lightning,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ActionCategory::Network => "Network Layer",
            ActionCategory::OnChain => "Chain / Wallet",
            ActionCategory::Lightning => "Lightning / Channel",
        }
    }

    pub fn actions(&self) -> impl Iterator<Item = ActionId> + '_ {
        ActionId::ALL
            .into_iter()
            .filter(move |action| action.category() == *self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionId {
    RestartService,
    LimitGossip,
    BanPeers,
    Wait,
    BumpFee,
    SweepFunds,
    MixCoins,
    RestoreSeed,
    ForceClose,
    JusticeTx,
    VerifySig,
    SignTx,
}

impl ActionId {
    pub const ALL: [ActionId; 12] = [
        ActionId::RestartService,
        ActionId::LimitGossip,
        ActionId::BanPeers,
        ActionId::Wait,
        ActionId::BumpFee,
        ActionId::SweepFunds,
        ActionId::MixCoins,
        ActionId::RestoreSeed,
        ActionId::ForceClose,
        ActionId::JusticeTx,
        ActionId::VerifySig,
        ActionId::SignTx,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionId::RestartService => "RESTART_SERVICE",
            ActionId::LimitGossip => "LIMIT_GOSSIP",
            ActionId::BanPeers => "BAN_PEERS",
            ActionId::Wait => "WAIT",
            ActionId::BumpFee => "BUMP_FEE",
            ActionId::SweepFunds => "SWEEP_FUNDS",
            ActionId::MixCoins => "MIX_COINS",
            ActionId::RestoreSeed => "RESTORE_SEED",
            ActionId::ForceClose => "FORCE_CLOSE",
            ActionId::JusticeTx => "JUSTICE_TX",
            ActionId::VerifySig => "VERIFY_SIG",
            ActionId::SignTx => "SIGN_TX",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionId::RestartService => "Restart Daemon",
            ActionId::LimitGossip => "Rate Limit Peers",
            ActionId::BanPeers => "Ban IP Range",
            ActionId::Wait => "Wait / Monitor",
            ActionId::BumpFee => "CPFP (Bump Fee)",
            ActionId::SweepFunds => "Sweep to Cold",
            ActionId::MixCoins => "CoinJoin",
            ActionId::RestoreSeed => "Restore Backup",
            ActionId::ForceClose => "Force Close",
            ActionId::JusticeTx => "Broadcast Justice",
            ActionId::VerifySig => "Verify Signature",
            ActionId::SignTx => "Sign & Broadcast",
        }
    }

    pub fn category(&self) -> ActionCategory {
        match self {
            ActionId::RestartService | ActionId::LimitGossip | ActionId::BanPeers | ActionId::Wait => {
                ActionCategory::Network
            }
            ActionId::BumpFee | ActionId::SweepFunds | ActionId::MixCoins | ActionId::RestoreSeed => {
                ActionCategory::OnChain
            }
            ActionId::ForceClose | ActionId::JusticeTx | ActionId::VerifySig | ActionId::SignTx => {
                ActionCategory::Lightning
            }
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for ActionId {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
        ActionId::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Valid and fatal action sets for one fault kind. Anything else is ineffective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolutionEntry {
    pub kind: FaultKind,
    pub valid_actions: &'static [ActionId],
    pub fatal_actions: &'static [ActionId],
}

impl ResolutionEntry {
    pub fn classify(&self, action: ActionId) -> Verdict {
        if self.valid_actions.contains(&action) {
            Verdict::Resolves
        } else if self.fatal_actions.contains(&action) {
            Verdict::Fatal
        } else {
            Verdict::Ineffective
        }
    }

    /// First valid action, surfaced by the debug overlay.
    pub fn recommended(&self) -> Option<ActionId> {
        self.valid_actions.first().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verdict {
    Resolves,
    Fatal,
    Ineffective,
}

/// Matrix row for `kind`. Exhaustive, so a new fault kind cannot ship
/// without deciding its remedies.
pub fn resolution(kind: FaultKind) -> ResolutionEntry {
    use ActionId::*;

    match kind {
        FaultKind::ChannelBreach => entry(kind, &[JusticeTx], &[Wait, RestartService]),
        FaultKind::FeeSpike => entry(kind, &[BumpFee], &[ForceClose]),
        FaultKind::DbCorruption => entry(kind, &[RestartService], &[BumpFee]),
        FaultKind::PeerDisconnect => entry(kind, &[Wait, RestartService], &[ForceClose]),
        FaultKind::GossipFlood => entry(kind, &[LimitGossip], &[]),
        FaultKind::SybilAttack => entry(kind, &[BanPeers], &[Wait]),
        FaultKind::DustStorm => entry(kind, &[LimitGossip, BumpFee], &[]),
        FaultKind::PrivacyLeak => entry(kind, &[MixCoins], &[Wait]),
        FaultKind::KeyLeak => entry(kind, &[SweepFunds], &[RestartService, Wait]),
        FaultKind::Phishing => entry(kind, &[VerifySig], &[SignTx]),
        FaultKind::BackupRot => entry(kind, &[RestoreSeed], &[RestartService]),
    }
}

const fn entry(
    kind: FaultKind,
    valid_actions: &'static [ActionId],
    fatal_actions: &'static [ActionId],
) -> ResolutionEntry {
    ResolutionEntry {
        kind,
        valid_actions,
        fatal_actions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_and_fatal_sets_never_overlap() {
        for kind in FaultKind::ALL {
            let entry = resolution(kind);
            assert!(!entry.valid_actions.is_empty(), "{kind} has no remedy");
            for action in entry.valid_actions {
                assert!(
                    !entry.fatal_actions.contains(action),
                    "{kind}: {action} is both valid and fatal"
                );
            }
        }
    }

    #[test]
    fn classification_follows_matrix() {
        let breach = resolution(FaultKind::ChannelBreach);
        assert_eq!(breach.classify(ActionId::JusticeTx), Verdict::Resolves);
        assert_eq!(breach.classify(ActionId::Wait), Verdict::Fatal);
        assert_eq!(breach.classify(ActionId::RestartService), Verdict::Fatal);
        assert_eq!(breach.classify(ActionId::MixCoins), Verdict::Ineffective);

        let outage = resolution(FaultKind::PeerDisconnect);
        assert_eq!(outage.classify(ActionId::Wait), Verdict::Resolves);
        assert_eq!(outage.recommended(), Some(ActionId::Wait));
    }

    #[test]
    fn palette_groups_four_actions_per_category() {
        for category in ActionCategory::ALL {
            assert_eq!(category.actions().count(), 4, "{}", category.label());
        }
    }

    #[test]
    fn action_names_round_trip_through_parse() {
        for action in ActionId::ALL {
            assert_eq!(action.as_str().parse::<ActionId>(), Ok(action));
        }
        assert_eq!("justice-tx".parse::<ActionId>(), Ok(ActionId::JusticeTx));
        assert!("reboot".parse::<ActionId>().is_err());
    }
}
