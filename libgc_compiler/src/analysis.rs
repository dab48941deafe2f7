use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use super::classifier::GroupLabel;
use super::diagnostic::{Condition, Diagnostics};
use super::gas::GasSpec;
use super::matcher::{MatchResult, PeakMatcher};
use super::table::RunTable;

/// How analysis results are keyed across groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportLayout {
    /// Only the keys of the run's own group
    Narrow,
    /// Keys for every group the classification policy can produce; the groups the run does
    /// not belong to are marked not applicable
    #[default]
    Wide,
}

/// Identifies one reported quantity: a gas, on a channel, for a group.
///
/// Renders as `<Group>_<Gas_Name>_Chan<n>`, e.g. `QC_Carbon_Dioxide_Chan3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisKey {
    pub group: GroupLabel,
    pub gas: String,
    pub channel: u32,
}

impl AnalysisKey {
    pub fn new(group: GroupLabel, gas: &GasSpec) -> Self {
        Self {
            group,
            gas: gas.name.clone(),
            channel: gas.channel,
        }
    }
}

impl fmt::Display for AnalysisKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_Chan{}",
            self.group,
            self.gas.replace(' ', "_"),
            self.channel
        )
    }
}

impl Serialize for AnalysisKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalysisValue {
    Quantity(f64),
    /// The gas was looked for but not found (or found more than once)
    Absent,
    /// The key belongs to a group other than the run's
    NotApplicable,
}

impl AnalysisValue {
    pub fn quantity(&self) -> Option<f64> {
        match self {
            Self::Quantity(q) => Some(*q),
            _ => None,
        }
    }
}

impl fmt::Display for AnalysisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quantity(q) => write!(f, "{q}"),
            Self::Absent => Ok(()),
            Self::NotApplicable => write!(f, "N/A"),
        }
    }
}

impl Serialize for AnalysisValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Quantity(q) => serializer.serialize_f64(*q),
            Self::Absent => serializer.serialize_none(),
            Self::NotApplicable => serializer.serialize_str("N/A"),
        }
    }
}

/// The analysis values of a run, in report column order (group, then configured gas order).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResults {
    entries: Vec<(AnalysisKey, AnalysisValue)>,
}

impl AnalysisResults {
    pub fn get(&self, key: &AnalysisKey) -> Option<&AnalysisValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(AnalysisKey, AnalysisValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Only the entries keyed to `group`
    pub fn for_group(&self, group: GroupLabel) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(key, _)| key.group == group)
                .cloned()
                .collect(),
        }
    }
}

impl Serialize for AnalysisResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in self.entries.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Pulls the configured analysis gases out of a classified run.
#[derive(Debug, Clone)]
pub struct AnalysisExtractor<'c> {
    gases: &'c [GasSpec],
    layout: ReportLayout,
    labels: &'static [GroupLabel],
}

impl<'c> AnalysisExtractor<'c> {
    /// `labels` are the groups the classification policy can produce, used by the wide
    /// layout
    pub fn new(gases: &'c [GasSpec], layout: ReportLayout, labels: &'static [GroupLabel]) -> Self {
        Self {
            gases,
            layout,
            labels,
        }
    }

    /// Every key this extractor can emit, in column order
    pub fn all_keys(&self) -> Vec<AnalysisKey> {
        self.labels
            .iter()
            .flat_map(|group| self.gases.iter().map(|gas| AnalysisKey::new(*group, gas)))
            .collect()
    }

    /// Extract the results of a run labelled `group`. An `Error` run has no results.
    pub fn extract(
        &self,
        table: &RunTable,
        group: GroupLabel,
        matcher: &PeakMatcher,
        diag: &mut Diagnostics,
    ) -> AnalysisResults {
        if group == GroupLabel::Error {
            return AnalysisResults::default();
        }

        let own: Vec<AnalysisValue> = self
            .gases
            .iter()
            .map(|gas| Self::lookup(table, gas, matcher, diag))
            .collect();

        let groups: &[GroupLabel] = match self.layout {
            ReportLayout::Narrow => std::slice::from_ref(&group),
            ReportLayout::Wide => self.labels,
        };
        let mut entries = Vec::with_capacity(groups.len() * self.gases.len());
        for g in groups {
            for (gas, value) in self.gases.iter().zip(own.iter()) {
                let value = if *g == group {
                    *value
                } else {
                    AnalysisValue::NotApplicable
                };
                entries.push((AnalysisKey::new(*g, gas), value));
            }
        }
        AnalysisResults { entries }
    }

    fn lookup(
        table: &RunTable,
        gas: &GasSpec,
        matcher: &PeakMatcher,
        diag: &mut Diagnostics,
    ) -> AnalysisValue {
        let MatchResult::Unique(record) = matcher.find(table, gas, diag) else {
            return AnalysisValue::Absent;
        };
        let cell = matcher.quantity(&record);
        match cell.as_f64() {
            Some(q) => AnalysisValue::Quantity(q),
            None => {
                diag.report(
                    Some(&gas.name),
                    Condition::NumericCoercionFailure {
                        column: matcher.quantity_column().to_string(),
                        value: cell.to_string(),
                    },
                );
                AnalysisValue::Absent
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{parse_table, TableLayout};

    const LABELS: [GroupLabel; 3] = [GroupLabel::Cathode, GroupLabel::Qc, GroupLabel::InertPurge];

    fn table(rows: &str) -> RunTable {
        let text = format!(">==CT==\nComponent\tChan#\tRetention\tArea\tESTD\n{rows}Totals\n");
        parse_table(&text, &TableLayout::default(), &mut Diagnostics::new("test"))
    }

    fn gases() -> Vec<GasSpec> {
        vec![
            GasSpec::new("Hydrogen", 1, 21.0, 26.0),
            GasSpec::new("Carbon Monoxide", 1, 60.0, 90.0),
            GasSpec::new("Oxygen", 1, 30.0, 33.0),
        ]
    }

    #[test]
    fn test_hydrogen_and_co() {
        let t = table("H2\t1\t24.0\t10\t5.2\nCO\t1\t70.0\t10\t0.5\n");
        let gases = gases();
        let extractor = AnalysisExtractor::new(&gases, ReportLayout::Narrow, &LABELS);
        let mut diag = Diagnostics::new("test");
        let results =
            extractor.extract(&t, GroupLabel::Cathode, &PeakMatcher::default(), &mut diag);
        let keys: Vec<String> = results.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "Cathode_Hydrogen_Chan1",
                "Cathode_Carbon_Monoxide_Chan1",
                "Cathode_Oxygen_Chan1"
            ]
        );
        let values: Vec<AnalysisValue> = results.iter().map(|(_, v)| *v).collect();
        assert_eq!(
            values,
            vec![
                AnalysisValue::Quantity(5.2),
                AnalysisValue::Quantity(0.5),
                AnalysisValue::Absent
            ]
        );
    }

    #[test]
    fn test_wide_layout_marks_other_groups() {
        let t = table("H2\t1\t24.0\t10\t5.2\n");
        let gases = gases();
        let extractor = AnalysisExtractor::new(&gases, ReportLayout::Wide, &LABELS);
        let results = extractor.extract(
            &t,
            GroupLabel::Qc,
            &PeakMatcher::default(),
            &mut Diagnostics::new("test"),
        );
        assert_eq!(results.len(), 9);
        let cathode_h2 = AnalysisKey::new(GroupLabel::Cathode, &gases[0]);
        let qc_h2 = AnalysisKey::new(GroupLabel::Qc, &gases[0]);
        assert_eq!(results.get(&cathode_h2), Some(&AnalysisValue::NotApplicable));
        assert_eq!(results.get(&qc_h2), Some(&AnalysisValue::Quantity(5.2)));
        assert_eq!(extractor.all_keys().len(), 9);
    }

    #[test]
    fn test_wide_filtered_equals_narrow() {
        let t = table("H2\t1\t24.0\t10\t5.2\nCO\t1\t70.0\t10\t0.5\nO2\t1\t31.0\t1\tbad\n");
        let gases = gases();
        let matcher = PeakMatcher::default();
        let wide = AnalysisExtractor::new(&gases, ReportLayout::Wide, &LABELS);
        let narrow = AnalysisExtractor::new(&gases, ReportLayout::Narrow, &LABELS);
        for group in LABELS {
            let w = wide.extract(&t, group, &matcher, &mut Diagnostics::new("w"));
            let n = narrow.extract(&t, group, &matcher, &mut Diagnostics::new("n"));
            assert_eq!(w.for_group(group), n);
        }
    }

    #[test]
    fn test_ambiguous_and_non_numeric_are_absent() {
        let t = table("H2\t1\t24.0\t10\t5.2\nH2\t1\t25.0\t10\t5.3\nO2\t1\t31.0\t1\tbad\n");
        let gases = gases();
        let extractor = AnalysisExtractor::new(&gases, ReportLayout::Narrow, &LABELS);
        let mut diag = Diagnostics::new("test");
        let results =
            extractor.extract(&t, GroupLabel::Cathode, &PeakMatcher::default(), &mut diag);
        assert_eq!(
            results.get(&AnalysisKey::new(GroupLabel::Cathode, &gases[0])),
            Some(&AnalysisValue::Absent)
        );
        assert_eq!(
            results.get(&AnalysisKey::new(GroupLabel::Cathode, &gases[2])),
            Some(&AnalysisValue::Absent)
        );
        assert!(diag.any(|c| matches!(c, Condition::NumericCoercionFailure { .. })));
    }

    #[test]
    fn test_error_group_has_no_results() {
        let t = table("H2\t1\t24.0\t10\t5.2\n");
        let gases = gases();
        let extractor = AnalysisExtractor::new(&gases, ReportLayout::Wide, &LABELS);
        let results = extractor.extract(
            &t,
            GroupLabel::Error,
            &PeakMatcher::default(),
            &mut Diagnostics::new("test"),
        );
        assert!(results.is_empty());
    }

    #[test]
    fn test_serialize() {
        let t = table("H2\t1\t24.0\t10\t5.2\n");
        let gases = vec![GasSpec::new("Hydrogen", 1, 21.0, 26.0)];
        let extractor =
            AnalysisExtractor::new(&gases, ReportLayout::Wide, &[GroupLabel::Cathode, GroupLabel::Qc]);
        let results = extractor.extract(
            &t,
            GroupLabel::Qc,
            &PeakMatcher::default(),
            &mut Diagnostics::new("test"),
        );
        let yaml = serde_yaml::to_string(&results).unwrap();
        assert!(yaml.starts_with("Cathode_Hydrogen_Chan1: "));
        assert!(yaml.contains("N/A"));
        assert!(yaml.ends_with("QC_Hydrogen_Chan1: 5.2\n"));
    }
}
