use serde::Serialize;

use crate::utils::clamp;

const BASE_SCORE: f64 = 100.0;

const MINT_AUTHORITY_PENALTY: f64 = 30.0;
const FREEZE_AUTHORITY_PENALTY: f64 = 20.0;
const MUTABLE_METADATA_PENALTY: f64 = 5.0;

/// (top-10 supply percent above which, penalty), checked highest first.
const CONCENTRATION_TIERS: [(f64, f64); 3] = [(50.0, 25.0), (30.0, 15.0), (20.0, 5.0)];
/// (holder count below which, penalty), checked lowest first.
const HOLDER_TIERS: [(u64, f64); 2] = [(100, 20.0), (1_000, 10.0)];

/// Inputs to the rug-pull heuristic. `None` means the provider did not say.
#[derive(Debug, Clone, Default)]
pub struct RiskSignals {
    pub mint_authority: Option<String>,
    pub freeze_authority: Option<String>,
    pub top10_supply_percent: Option<f64>,
    pub total_holders: Option<u64>,
    pub metadata_mutable: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "High Risk")]
    High,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => RiskLevel::Low,
            50..=79 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::High => "High Risk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskFlag {
    pub code: &'static str,
    pub message: String,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    /// 0 (almost certainly a rug) to 100 (no red flags found).
    pub score: u8,
    pub risk: RiskLevel,
    pub flags: Vec<RiskFlag>,
}

fn authority_active(a: &Option<String>) -> bool {
    a.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

pub fn score_token(signals: &RiskSignals) -> RiskAssessment {
    let mut flags = Vec::new();

    if authority_active(&signals.mint_authority) {
        flags.push(RiskFlag {
            code: "mint_authority",
            message: "Mint authority is active: supply can be inflated".to_string(),
            points: MINT_AUTHORITY_PENALTY,
        });
    }
    if authority_active(&signals.freeze_authority) {
        flags.push(RiskFlag {
            code: "freeze_authority",
            message: "Freeze authority is active: holder accounts can be frozen".to_string(),
            points: FREEZE_AUTHORITY_PENALTY,
        });
    }

    if let Some(pct) = signals.top10_supply_percent.filter(|p| p.is_finite()) {
        if let Some((limit, points)) = CONCENTRATION_TIERS.iter().find(|(limit, _)| pct > *limit) {
            flags.push(RiskFlag {
                code: "holder_concentration",
                message: format!("Top 10 holders own {pct:.1}% of supply (> {limit:.0}%)"),
                points: *points,
            });
        }
    }

    if let Some(holders) = signals.total_holders {
        if let Some((limit, points)) = HOLDER_TIERS.iter().find(|(limit, _)| holders < *limit) {
            flags.push(RiskFlag {
                code: "low_holder_count",
                message: format!("Only {holders} holders (< {limit})"),
                points: *points,
            });
        }
    }

    if signals.metadata_mutable == Some(true) {
        flags.push(RiskFlag {
            code: "mutable_metadata",
            message: "Token metadata can still be changed".to_string(),
            points: MUTABLE_METADATA_PENALTY,
        });
    }

    let deducted: f64 = flags.iter().map(|f| f.points).sum();
    let score = clamp(BASE_SCORE - deducted, 0.0, 100.0).round() as u8;

    RiskAssessment {
        score,
        risk: RiskLevel::from_score(score),
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worst() -> RiskSignals {
        RiskSignals {
            mint_authority: Some("auth".into()),
            freeze_authority: Some("auth".into()),
            top10_supply_percent: Some(99.0),
            total_holders: Some(3),
            metadata_mutable: Some(true),
        }
    }

    #[test]
    fn clean_token_scores_full() {
        let a = score_token(&RiskSignals {
            top10_supply_percent: Some(12.0),
            total_holders: Some(50_000),
            metadata_mutable: Some(false),
            ..Default::default()
        });
        assert_eq!(a.score, 100);
        assert_eq!(a.risk, RiskLevel::Low);
        assert!(a.flags.is_empty());
    }

    #[test]
    fn every_red_flag_bottoms_out_at_zero() {
        let a = score_token(&worst());
        assert_eq!(a.score, 0);
        assert_eq!(a.risk, RiskLevel::High);
        assert_eq!(a.flags.len(), 5);
    }

    #[test]
    fn authorities_only() {
        let a = score_token(&RiskSignals {
            mint_authority: Some("m".into()),
            freeze_authority: Some("f".into()),
            ..Default::default()
        });
        assert_eq!(a.score, 50);
        assert_eq!(a.risk, RiskLevel::Medium);
    }

    #[test]
    fn blank_authority_counts_as_revoked() {
        let a = score_token(&RiskSignals {
            mint_authority: Some("   ".into()),
            ..Default::default()
        });
        assert_eq!(a.score, 100);
    }

    #[test]
    fn concentration_tiers() {
        let at = |pct: f64| {
            score_token(&RiskSignals {
                top10_supply_percent: Some(pct),
                ..Default::default()
            })
            .score
        };
        assert_eq!(at(20.0), 100);
        assert_eq!(at(25.0), 95);
        assert_eq!(at(35.0), 85);
        assert_eq!(at(50.0), 85);
        assert_eq!(at(50.1), 75);
    }

    #[test]
    fn holder_tiers() {
        let at = |n: u64| {
            score_token(&RiskSignals {
                total_holders: Some(n),
                ..Default::default()
            })
            .score
        };
        assert_eq!(at(0), 80);
        assert_eq!(at(99), 80);
        assert_eq!(at(100), 90);
        assert_eq!(at(999), 90);
        assert_eq!(at(1_000), 100);
    }

    #[test]
    fn score_stays_in_range_for_arbitrary_inputs() {
        let pcts = [
            None,
            Some(f64::NAN),
            Some(f64::INFINITY),
            Some(f64::NEG_INFINITY),
            Some(-50.0),
            Some(0.0),
            Some(30.0),
            Some(1e12),
        ];
        let holders = [None, Some(0), Some(99), Some(1_000), Some(u64::MAX)];
        let auths = [None, Some(String::new()), Some("x".to_string())];
        for pct in pcts {
            for h in holders {
                for mint in &auths {
                    for freeze in &auths {
                        for mutable in [None, Some(false), Some(true)] {
                            let a = score_token(&RiskSignals {
                                mint_authority: mint.clone(),
                                freeze_authority: freeze.clone(),
                                top10_supply_percent: pct,
                                total_holders: h,
                                metadata_mutable: mutable,
                            });
                            assert!(a.score <= 100);
                            assert_eq!(a.risk, RiskLevel::from_score(a.score));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn label_boundaries() {
        assert_eq!(RiskLevel::from_score(80), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(79), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(49), RiskLevel::High);
        assert_eq!(RiskLevel::High.as_str(), "High Risk");
    }

    #[test]
    fn risk_level_serializes_as_label() {
        let v = serde_json::to_value(RiskLevel::Medium).unwrap();
        assert_eq!(v, serde_json::json!("Medium Risk"));
    }
}
