use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

/// Learning track selecting which fault catalog applies to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackId {
    #[default]
    LightningOperator,
    Sovereign,
    WalletMastery,
    ProtocolEngineer,
    SovereignMerchant,
    SecurityPractitioner,
    P2pMarket,
    CommunityBuilder,
}

impl TrackId {
    pub const ALL: [TrackId; 8] = [
        TrackId::LightningOperator,
        TrackId::Sovereign,
        TrackId::WalletMastery,
        TrackId::ProtocolEngineer,
        TrackId::SovereignMerchant,
        TrackId::SecurityPractitioner,
        TrackId::P2pMarket,
        TrackId::CommunityBuilder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackId::LightningOperator => "LIGHTNING_OPERATOR",
            TrackId::Sovereign => "SOVEREIGN",
            TrackId::WalletMastery => "WALLET_MASTERY",
            TrackId::ProtocolEngineer => "PROTOCOL_ENGINEER",
            TrackId::SovereignMerchant => "SOVEREIGN_MERCHANT",
            TrackId::SecurityPractitioner => "SECURITY_PRACTITIONER",
            TrackId::P2pMarket => "P2P_MARKET",
            TrackId::CommunityBuilder => "COMMUNITY_BUILDER",
        }
    }

    /// Parses a track name, substituting the default track for unknown input.
    pub fn from_name_or_default(name: &str) -> TrackId {
        match name.parse() {
            Ok(track) => track,
            Err(err) => {
                tracing::warn!(
                    target: "drill::catalog",
                    error = %err,
                    fallback = %TrackId::default(),
                    "track.unknown"
                );
                TrackId::default()
            }
        }
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown track '{0}'")]
pub struct UnknownTrack(pub String);

impl FromStr for TrackId {
    type Err = UnknownTrack;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
        TrackId::ALL
            .into_iter()
            .find(|track| track.as_str() == normalized)
            .ok_or_else(|| UnknownTrack(s.to_string()))
    }
}

/// Closed set of fault types. Every variant has a resolution entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultKind {
    ChannelBreach,
    FeeSpike,
    DbCorruption,
    PeerDisconnect,
    GossipFlood,
    SybilAttack,
    DustStorm,
    PrivacyLeak,
    KeyLeak,
    Phishing,
    BackupRot,
}

impl FaultKind {
    pub const ALL: [FaultKind; 11] = [
        FaultKind::ChannelBreach,
        FaultKind::FeeSpike,
        FaultKind::DbCorruption,
        FaultKind::PeerDisconnect,
        FaultKind::GossipFlood,
        FaultKind::SybilAttack,
        FaultKind::DustStorm,
        FaultKind::PrivacyLeak,
        FaultKind::KeyLeak,
        FaultKind::Phishing,
        FaultKind::BackupRot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::ChannelBreach => "CHANNEL_BREACH",
            FaultKind::FeeSpike => "FEE_SPIKE",
            FaultKind::DbCorruption => "DB_CORRUPTION",
            FaultKind::PeerDisconnect => "PEER_DISCONNECT",
            FaultKind::GossipFlood => "GOSSIP_FLOOD",
            FaultKind::SybilAttack => "SYBIL_ATTACK",
            FaultKind::DustStorm => "DUST_STORM",
            FaultKind::PrivacyLeak => "PRIVACY_LEAK",
            FaultKind::KeyLeak => "KEY_LEAK",
            FaultKind::Phishing => "PHISHING",
            FaultKind::BackupRot => "BACKUP_ROT",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Immutable catalog entry from which active faults are instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaultTemplate {
    pub kind: FaultKind,
    pub title: &'static str,
    pub symptom: &'static str,
    pub root_cause: &'static str,
    pub severity: Severity,
    /// Health lost per tick while an instance stays unresolved.
    pub decay_rate: f64,
}

static LIGHTNING_OPERATOR: &[FaultTemplate] = &[
    FaultTemplate {
        kind: FaultKind::ChannelBreach,
        title: "HTLC Breach Attempt",
        symptom: "WARN: Channel 24x789 state mismatch. Remote peer broadcasting old commitment.",
        root_cause: "Malicious Peer",
        severity: Severity::Critical,
        decay_rate: 2.0,
    },
    FaultTemplate {
        kind: FaultKind::FeeSpike,
        title: "Mempool Congestion",
        symptom: "ERROR: 14 HTLCs pending. Commitment tx fee below relay threshold.",
        root_cause: "Fee Market",
        severity: Severity::High,
        decay_rate: 0.8,
    },
    FaultTemplate {
        kind: FaultKind::DbCorruption,
        title: "State DB Lock",
        symptom: "FATAL: channel.db is locked by another process. RPC unresponsive.",
        root_cause: "IO Failure",
        severity: Severity::High,
        decay_rate: 1.2,
    },
    FaultTemplate {
        kind: FaultKind::PeerDisconnect,
        title: "Liquidity Partition",
        symptom: "INFO: 80% of inbound liquidity offline. Routing failures increasing.",
        root_cause: "Network Outage",
        severity: Severity::Medium,
        decay_rate: 0.4,
    },
    FaultTemplate {
        kind: FaultKind::GossipFlood,
        title: "Gossip Storm",
        symptom: "WARN: CPU load > 95%. Processing excessive channel updates.",
        root_cause: "Spam",
        severity: Severity::Low,
        decay_rate: 0.2,
    },
];

static SOVEREIGN: &[FaultTemplate] = &[
    FaultTemplate {
        kind: FaultKind::SybilAttack,
        title: "Sybil Attack",
        symptom: "WARN: 80% of peers returning invalid headers. Consensus divergent.",
        root_cause: "Network Partition",
        severity: Severity::High,
        decay_rate: 1.2,
    },
    FaultTemplate {
        kind: FaultKind::DustStorm,
        title: "Dust Attack",
        symptom: "Mempool spiked to 300MB. Minimum relay fee increased to 20 sat/vB.",
        root_cause: "Spam Attack",
        severity: Severity::Medium,
        decay_rate: 0.6,
    },
    FaultTemplate {
        kind: FaultKind::KeyLeak,
        title: "Weak Entropy",
        symptom: "CRITICAL: Key generation PRNG flagged as insecure.",
        root_cause: "Weak Randomness",
        severity: Severity::Critical,
        decay_rate: 2.5,
    },
];

static WALLET_MASTERY: &[FaultTemplate] = &[
    FaultTemplate {
        kind: FaultKind::KeyLeak,
        title: "Entropy Failure",
        symptom: "CRITICAL: PRNG weakness detected in signing module.",
        root_cause: "Weak Randomness",
        severity: Severity::Critical,
        decay_rate: 2.0,
    },
    FaultTemplate {
        kind: FaultKind::Phishing,
        title: "Clipboard Hijack",
        symptom: "WARN: Destination address mismatch detected during signing.",
        root_cause: "Malware",
        severity: Severity::High,
        decay_rate: 1.0,
    },
    FaultTemplate {
        kind: FaultKind::BackupRot,
        title: "Bit Rot",
        symptom: "ERROR: Checksum failure on mnemonic shard #2.",
        root_cause: "Data Corruption",
        severity: Severity::Medium,
        decay_rate: 0.5,
    },
];

/// Ordered template list for `track`, or the default track's list when the
/// track has no catalog of its own.
pub fn templates_for_track(track: TrackId) -> &'static [FaultTemplate] {
    match track {
        TrackId::LightningOperator => LIGHTNING_OPERATOR,
        TrackId::Sovereign => SOVEREIGN,
        TrackId::WalletMastery => WALLET_MASTERY,
        TrackId::ProtocolEngineer
        | TrackId::SovereignMerchant
        | TrackId::SecurityPractitioner
        | TrackId::P2pMarket
        | TrackId::CommunityBuilder => templates_for_track(TrackId::default()),
    }
}

/// Catalog bound to a session: the requested track plus its resolved templates.
#[derive(Debug, Clone, Copy)]
pub struct Track {
    id: TrackId,
    templates: &'static [FaultTemplate],
}

impl Track {
    pub fn new(id: TrackId) -> Self {
        Self {
            id,
            templates: templates_for_track(id),
        }
    }

    /// Binds an explicit template list, used by scripted drills and tests.
    pub fn with_templates(id: TrackId, templates: &'static [FaultTemplate]) -> Self {
        Self { id, templates }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn templates(&self) -> &'static [FaultTemplate] {
        self.templates
    }

    pub fn template(&self, kind: FaultKind) -> Option<&'static FaultTemplate> {
        self.templates.iter().find(|template| template.kind == kind)
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::new(TrackId::default())
    }
}
