//! Derivation of a run's group label from its identifier gases.
//!
//! Two deployments of the instrument use two different decision procedures. Both implement
//! [`Classify`] and the configuration picks one through [`ClassificationPolicy`].
use serde::{Deserialize, Serialize};
use std::fmt;

use super::cell::CellValue;
use super::diagnostic::{Condition, Diagnostics};
use super::gas::{GasSpec, Range};
use super::matcher::{MatchResult, PeakMatcher};
use super::table::{PeakRecord, RunTable};

/// The derived identity of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupLabel {
    Cathode,
    Anode,
    #[serde(rename = "QC")]
    Qc,
    /// Inert (nitrogen) purge
    #[serde(rename = "N2")]
    InertPurge,
    #[serde(rename = "N/A")]
    Unidentified,
    Error,
}

impl GroupLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cathode => "Cathode",
            Self::Anode => "Anode",
            Self::Qc => "QC",
            Self::InertPurge => "N2",
            Self::Unidentified => "N/A",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decision procedure over identifier gas matches.
///
/// Implementations are total: every table, including an empty one, maps to a label, with
/// `GroupLabel::Error` for conflicting or unusable input.
pub trait Classify {
    fn classify(&self, table: &RunTable, matcher: &PeakMatcher, diag: &mut Diagnostics)
        -> GroupLabel;

    /// The labels this procedure can produce, apart from `Error`, in report order
    fn labels(&self) -> &'static [GroupLabel];
}

/// Report a conflict and hand back the Error label
fn conflict(diag: &mut Diagnostics, gas: Option<&str>, reason: String) -> GroupLabel {
    diag.report(gas, Condition::ClassificationConflict { reason });
    GroupLabel::Error
}

/// Read a numeric cell the procedure depends on, reporting a coercion failure otherwise
fn numeric(
    value: &CellValue,
    column: &str,
    gas: &GasSpec,
    diag: &mut Diagnostics,
) -> Option<f64> {
    match value.as_f64() {
        Some(v) => Some(v),
        None => {
            diag.report(
                Some(&gas.name),
                Condition::NumericCoercionFailure {
                    column: column.to_string(),
                    value: value.to_string(),
                },
            );
            None
        }
    }
}

fn quantity_of(
    record: &PeakRecord<'_>,
    gas: &GasSpec,
    matcher: &PeakMatcher,
    diag: &mut Diagnostics,
) -> Option<f64> {
    numeric(matcher.quantity(record), matcher.quantity_column(), gas, diag)
}

/// Identification by three gases: nitrogen, carbon dioxide and carbon monoxide in the
/// original deployment.
///
/// In order:
/// 1. any ambiguous match is an `Error`
/// 2. `gas_1` absent while `gas_2` present is the `Cathode`
/// 3. a non-numeric quantity for `gas_2` or `gas_3` is an `Error`; both with a quantity
///    inside `qc_band` is `QC`
/// 4. otherwise the larger area of `gas_1` vs `gas_2` decides: `gas_1` larger is the
///    `Anode`, smaller is the `Cathode`, equal is an `Error`
/// 5. anything left over (not enough peaks to compare) is an `Error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreeIdentifierPolicy {
    pub gas_1: GasSpec,
    pub gas_2: GasSpec,
    pub gas_3: GasSpec,
    pub qc_band: Range,
}

impl Default for ThreeIdentifierPolicy {
    fn default() -> Self {
        Self {
            gas_1: GasSpec::new("Nitrogen", 2, 31.0, 33.0),
            gas_2: GasSpec::new("Carbon Dioxide", 3, 20.0, 26.0),
            gas_3: GasSpec::new("Carbon Monoxide", 1, 60.0, 90.0),
            qc_band: Range::new(0.4, 0.6),
        }
    }
}

const THREE_IDENTIFIER_LABELS: [GroupLabel; 3] =
    [GroupLabel::Cathode, GroupLabel::Anode, GroupLabel::Qc];

impl Classify for ThreeIdentifierPolicy {
    fn classify(
        &self,
        table: &RunTable,
        matcher: &PeakMatcher,
        diag: &mut Diagnostics,
    ) -> GroupLabel {
        let g1 = matcher.find(table, &self.gas_1, diag);
        let g2 = matcher.find(table, &self.gas_2, diag);
        let g3 = matcher.find(table, &self.gas_3, diag);

        if let Some(gas) = [(&g1, &self.gas_1), (&g2, &self.gas_2), (&g3, &self.gas_3)]
            .into_iter()
            .find_map(|(found, gas)| found.is_ambiguous().then_some(gas))
        {
            return conflict(
                diag,
                Some(&gas.name),
                String::from("identifier gas matched ambiguously"),
            );
        }

        let (r1, r2, r3) = (g1.record(), g2.record(), g3.record());
        if r1.is_none() && r2.is_some() {
            log::debug!(
                "[{}] {} absent, {} present",
                diag.run(),
                self.gas_1.name,
                self.gas_2.name
            );
            return GroupLabel::Cathode;
        }

        // Every quantity present must be numeric, whether or not the QC rule applies
        let mut quantities = [None, None];
        for (slot, (record, gas)) in quantities
            .iter_mut()
            .zip([(r2.as_ref(), &self.gas_2), (r3.as_ref(), &self.gas_3)])
        {
            let Some(record) = record else {
                continue;
            };
            match quantity_of(record, gas, matcher, diag) {
                Some(q) => *slot = Some(q),
                None => {
                    return conflict(
                        diag,
                        Some(&gas.name),
                        String::from("identifier quantity is not numeric"),
                    )
                }
            }
        }
        if let [Some(q2), Some(q3)] = quantities {
            if self.qc_band.contains(q2) && self.qc_band.contains(q3) {
                return GroupLabel::Qc;
            }
        }

        let (Some(rec1), Some(rec2)) = (r1.as_ref(), r2.as_ref()) else {
            let missing = if r1.is_none() { &self.gas_1 } else { &self.gas_2 };
            return conflict(
                diag,
                Some(&missing.name),
                format!(
                    "insufficient data to compare areas of {} and {}",
                    self.gas_1.name, self.gas_2.name
                ),
            );
        };
        let area1 = numeric(matcher.area(rec1), matcher.area_column(), &self.gas_1, diag);
        let area2 = numeric(matcher.area(rec2), matcher.area_column(), &self.gas_2, diag);
        let (Some(area1), Some(area2)) = (area1, area2) else {
            let gas = if area1.is_none() { &self.gas_1 } else { &self.gas_2 };
            return conflict(
                diag,
                Some(&gas.name),
                String::from("identifier area is not numeric"),
            );
        };

        if area1 > area2 {
            GroupLabel::Anode
        } else if area1 < area2 {
            GroupLabel::Cathode
        } else {
            conflict(
                diag,
                Some(&self.gas_1.name),
                format!(
                    "areas of {} and {} are equal ({area1})",
                    self.gas_1.name, self.gas_2.name
                ),
            )
        }
    }

    fn labels(&self) -> &'static [GroupLabel] {
        &THREE_IDENTIFIER_LABELS
    }
}

/// Identification by carbon dioxide with a nitrogen fallback.
///
/// With CO2 present its quantity decides: below `qc_band` is an inert purge, inside is `QC`
/// and above is the `Cathode`. Without CO2 a nitrogen peak still marks an inert purge;
/// with neither the run is unidentified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoIdentifierPolicy {
    pub co2: GasSpec,
    pub n2: GasSpec,
    pub qc_band: Range,
}

impl Default for TwoIdentifierPolicy {
    fn default() -> Self {
        Self {
            co2: GasSpec::new("Carbon Dioxide", 3, 20.0, 26.0),
            n2: GasSpec::new("Nitrogen", 3, 15.0, 20.0),
            qc_band: Range::new(0.4, 1.0),
        }
    }
}

const TWO_IDENTIFIER_LABELS: [GroupLabel; 4] = [
    GroupLabel::Cathode,
    GroupLabel::Qc,
    GroupLabel::InertPurge,
    GroupLabel::Unidentified,
];

impl Classify for TwoIdentifierPolicy {
    fn classify(
        &self,
        table: &RunTable,
        matcher: &PeakMatcher,
        diag: &mut Diagnostics,
    ) -> GroupLabel {
        let co2 = matcher.find(table, &self.co2, diag);
        let n2 = matcher.find(table, &self.n2, diag);

        if let Some(gas) = [(&co2, &self.co2), (&n2, &self.n2)]
            .into_iter()
            .find_map(|(found, gas)| found.is_ambiguous().then_some(gas))
        {
            return conflict(
                diag,
                Some(&gas.name),
                String::from("identifier gas matched ambiguously"),
            );
        }

        match (co2, n2) {
            (MatchResult::Unique(record), _) => {
                let Some(quantity) = quantity_of(&record, &self.co2, matcher, diag) else {
                    return conflict(
                        diag,
                        Some(&self.co2.name),
                        String::from("identifier quantity is not numeric"),
                    );
                };
                if quantity < self.qc_band.min {
                    GroupLabel::InertPurge
                } else if quantity <= self.qc_band.max {
                    GroupLabel::Qc
                } else {
                    GroupLabel::Cathode
                }
            }
            (_, MatchResult::Unique(_)) => GroupLabel::InertPurge,
            _ => GroupLabel::Unidentified,
        }
    }

    fn labels(&self) -> &'static [GroupLabel] {
        &TWO_IDENTIFIER_LABELS
    }
}

/// The configured classification procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ClassificationPolicy {
    ThreeIdentifier(ThreeIdentifierPolicy),
    TwoIdentifier(TwoIdentifierPolicy),
}

impl ClassificationPolicy {
    /// Every gas the procedure looks up
    pub fn identifier_gases(&self) -> Vec<&GasSpec> {
        match self {
            Self::ThreeIdentifier(p) => vec![&p.gas_1, &p.gas_2, &p.gas_3],
            Self::TwoIdentifier(p) => vec![&p.co2, &p.n2],
        }
    }

    pub fn qc_band(&self) -> &Range {
        match self {
            Self::ThreeIdentifier(p) => &p.qc_band,
            Self::TwoIdentifier(p) => &p.qc_band,
        }
    }
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self::TwoIdentifier(TwoIdentifierPolicy::default())
    }
}

impl Classify for ClassificationPolicy {
    fn classify(
        &self,
        table: &RunTable,
        matcher: &PeakMatcher,
        diag: &mut Diagnostics,
    ) -> GroupLabel {
        match self {
            Self::ThreeIdentifier(p) => p.classify(table, matcher, diag),
            Self::TwoIdentifier(p) => p.classify(table, matcher, diag),
        }
    }

    fn labels(&self) -> &'static [GroupLabel] {
        match self {
            Self::ThreeIdentifier(p) => p.labels(),
            Self::TwoIdentifier(p) => p.labels(),
        }
    }
}
