//! Form contract: one input per feature, with a domain and a default.
//!
//! A [`Form`] is derived from the training frame. It describes what a user
//! may enter for each feature and pre-fills every field, so a prediction can
//! be requested by overriding only the fields of interest.

use crate::dataset::Frame;
use crate::error::{PipelineError, Result};
use crate::record::{canonical_label, normalize_label, FeatureValue, InputRecord};
use crate::schema::{FeatureKind, FeatureSchema};
use serde::{Deserialize, Serialize};

/// Declared range of a numeric field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRange {
    /// A share in `[0, 1]`.
    Fraction,
    /// A non-negative whole number.
    Count,
    /// Any finite number.
    Any,
}

/// Human label and range for one feature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldLabel {
    pub name: &'static str,
    pub label: &'static str,
    pub range: ValueRange,
}

impl FieldLabel {
    pub const fn new(name: &'static str, label: &'static str, range: ValueRange) -> Self {
        Self { name, label, range }
    }
}

/// Values a field accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldDomain {
    /// One of a fixed list of labels.
    Options { options: Vec<String> },
    /// A whole number in `[min, max]`.
    IntegerRange { min: i64, max: i64 },
    /// A number within optional bounds.
    Number {
        min: Option<f64>,
        max: Option<f64>,
        integer: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FeatureKind,
    pub domain: FieldDomain,
    pub default: FeatureValue,
}

impl FormField {
    /// Check `value` against the field's domain.
    fn validate(&self, value: &FeatureValue) -> Result<()> {
        match (&self.domain, value) {
            (FieldDomain::Options { options }, _) => {
                let label = match value {
                    FeatureValue::Category(s) if self.kind == FeatureKind::Ordinal => {
                        normalize_label(s)
                    }
                    FeatureValue::Category(s) => s.clone(),
                    FeatureValue::Number(n) if self.kind == FeatureKind::Ordinal => {
                        canonical_label(*n)
                    }
                    FeatureValue::Number(n) => {
                        return Err(PipelineError::TypeMismatch {
                            feature: self.name.clone(),
                            expected: self.kind,
                            got: format!("number {}", n),
                        })
                    }
                };
                if options.contains(&label) {
                    Ok(())
                } else {
                    Err(PipelineError::SchemaMismatch {
                        feature: self.name.clone(),
                        category: label,
                    })
                }
            }
            (FieldDomain::IntegerRange { min, max }, _) => {
                let n = match value {
                    FeatureValue::Number(n) => *n,
                    FeatureValue::Category(s) => {
                        s.trim()
                            .parse::<f64>()
                            .map_err(|_| PipelineError::InvalidValue {
                                feature: self.name.clone(),
                                message: format!("{:?} is not a whole number", s),
                            })?
                    }
                };
                check_number(&self.name, n, Some(*min as f64), Some(*max as f64), true)
            }
            (FieldDomain::Number { min, max, integer }, FeatureValue::Number(n)) => {
                check_number(&self.name, *n, *min, *max, *integer)
            }
            (FieldDomain::Number { .. }, FeatureValue::Category(s)) => {
                Err(PipelineError::TypeMismatch {
                    feature: self.name.clone(),
                    expected: self.kind,
                    got: format!("category {:?}", s),
                })
            }
        }
    }
}

fn check_number(
    name: &str,
    value: f64,
    min: Option<f64>,
    max: Option<f64>,
    integer: bool,
) -> Result<()> {
    if !value.is_finite() {
        return Err(PipelineError::InvalidValue {
            feature: name.to_string(),
            message: format!("{} is not finite", value),
        });
    }
    if integer && value.fract() != 0.0 {
        return Err(PipelineError::InvalidValue {
            feature: name.to_string(),
            message: format!("{} is not a whole number", value),
        });
    }
    let lo = min.unwrap_or(f64::NEG_INFINITY);
    let hi = max.unwrap_or(f64::INFINITY);
    if value < lo || value > hi {
        return Err(PipelineError::OutOfRange {
            feature: name.to_string(),
            value,
            min: lo,
            max: hi,
        });
    }
    Ok(())
}

/// One field per schema feature, in schema order.
#[derive(Clone, Debug, Serialize)]
pub struct Form {
    #[serde(skip)]
    schema: FeatureSchema,
    fields: Vec<FormField>,
}

impl Form {
    /// Derive fields from a frame.
    ///
    /// - categorical: sorted unique labels, modal default
    /// - ordinal, all whole numbers: integer range `[min, max]`, default `min`
    /// - ordinal otherwise: sorted unique labels, modal default
    /// - numeric: range from `labels`, default the column mean (truncated
    ///   for [`ValueRange::Count`] fields)
    pub fn from_frame(frame: &Frame, labels: &[FieldLabel]) -> Result<Self> {
        if frame.is_empty() {
            return Err(PipelineError::EmptyData(
                "cannot derive a form from an empty frame".to_string(),
            ));
        }

        let mut fields = Vec::with_capacity(frame.schema().len());
        for spec in frame.schema().iter() {
            let meta = labels.iter().find(|l| l.name == spec.name);
            let label = meta.map(|l| l.label.to_string()).unwrap_or_else(|| spec.name.clone());

            let (domain, default) = match spec.kind {
                FeatureKind::Categorical => (
                    FieldDomain::Options {
                        options: frame.unique_labels(&spec.name)?,
                    },
                    FeatureValue::Category(frame.mode(&spec.name)?),
                ),
                FeatureKind::Ordinal => {
                    let options = frame.unique_labels(&spec.name)?;
                    match whole_numbers(&options) {
                        Some(values) => {
                            let min = values.iter().copied().min().unwrap_or(0);
                            let max = values.iter().copied().max().unwrap_or(0);
                            (
                                FieldDomain::IntegerRange { min, max },
                                FeatureValue::Number(min as f64),
                            )
                        }
                        None => (
                            FieldDomain::Options { options },
                            FeatureValue::Category(frame.mode(&spec.name)?),
                        ),
                    }
                }
                FeatureKind::Numeric => {
                    let mean = frame.mean(&spec.name)?;
                    let range = meta.map(|l| l.range).unwrap_or(ValueRange::Any);
                    let domain = match range {
                        ValueRange::Fraction => FieldDomain::Number {
                            min: Some(0.0),
                            max: Some(1.0),
                            integer: false,
                        },
                        ValueRange::Count => FieldDomain::Number {
                            min: Some(0.0),
                            max: None,
                            integer: true,
                        },
                        ValueRange::Any => FieldDomain::Number {
                            min: None,
                            max: None,
                            integer: false,
                        },
                    };
                    let default = if range == ValueRange::Count {
                        mean.trunc()
                    } else {
                        mean
                    };
                    (domain, FeatureValue::Number(default))
                }
            };

            fields.push(FormField {
                name: spec.name.clone(),
                label,
                kind: spec.kind,
                domain,
                default,
            });
        }

        tracing::debug!(fields = fields.len(), "derived form");
        Ok(Self {
            schema: frame.schema().clone(),
            fields,
        })
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The pre-filled record.
    pub fn defaults(&self) -> Result<InputRecord> {
        self.fill(Vec::<(String, FeatureValue)>::new())
    }

    /// Start from the defaults, apply `overrides` and validate every value.
    ///
    /// # Errors
    /// - [`PipelineError::UnknownFeature`] for an override with no field
    /// - [`PipelineError::OutOfRange`] for a number outside its field's bounds
    /// - [`PipelineError::SchemaMismatch`] for a label outside its field's options
    pub fn fill<I, K>(&self, overrides: I) -> Result<InputRecord>
    where
        I: IntoIterator<Item = (K, FeatureValue)>,
        K: Into<String>,
    {
        let mut values: Vec<(String, FeatureValue)> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.default.clone()))
            .collect();

        for (name, value) in overrides {
            let name = name.into();
            match values.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = value,
                None => return Err(PipelineError::UnknownFeature { name }),
            }
        }

        for (field, (_, value)) in self.fields.iter().zip(&values) {
            field.validate(value)?;
        }
        InputRecord::new(&self.schema, values)
    }

    /// Parse a raw text value for `name` according to the field's kind.
    pub fn parse_value(&self, name: &str, raw: &str) -> Result<FeatureValue> {
        let field = self.field(name).ok_or_else(|| PipelineError::UnknownFeature {
            name: name.to_string(),
        })?;
        FeatureValue::parse(name, field.kind, raw)
    }
}

/// All labels as whole numbers, or `None` if any is not one.
fn whole_numbers(labels: &[String]) -> Option<Vec<i64>> {
    labels
        .iter()
        .map(|l| l.parse::<i64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn frame() -> Frame {
        let schema = FeatureSchema::builder()
            .categorical("state")
            .ordinal("year")
            .numeric("total_pop")
            .numeric("poverty_rate")
            .numeric("zhvi")
            .build()
            .unwrap();
        Frame::new(
            schema,
            vec![
                Column::Categorical(vec!["TX".into(), "OH".into(), "OH".into()]),
                Column::Categorical(vec!["2012".into(), "2010".into(), "2011".into()]),
                Column::Numeric(vec![100.0, 200.0, 301.0]),
                Column::Numeric(vec![0.1, 0.2, 0.3]),
                Column::Numeric(vec![-1.0, 0.0, 4.0]),
            ],
        )
        .unwrap()
    }

    fn labels() -> Vec<FieldLabel> {
        vec![
            FieldLabel::new("state", "Select State", ValueRange::Any),
            FieldLabel::new("year", "Select Year", ValueRange::Any),
            FieldLabel::new("total_pop", "Total Population", ValueRange::Count),
            FieldLabel::new("poverty_rate", "Poverty Rate (%)", ValueRange::Fraction),
        ]
    }

    #[test]
    fn test_form_domains_and_defaults() {
        let form = Form::from_frame(&frame(), &labels()).unwrap();
        assert_eq!(form.fields().len(), 5);

        let state = form.field("state").unwrap();
        assert_eq!(
            state.domain,
            FieldDomain::Options {
                options: vec!["OH".to_string(), "TX".to_string()]
            }
        );
        assert_eq!(state.default, FeatureValue::Category("OH".to_string()));

        let year = form.field("year").unwrap();
        assert_eq!(year.domain, FieldDomain::IntegerRange { min: 2010, max: 2012 });
        assert_eq!(year.default, FeatureValue::Number(2010.0));

        // int(mean) for counts
        assert_eq!(
            form.field("total_pop").unwrap().default,
            FeatureValue::Number(200.0)
        );

        // no label entry: name as label, unbounded
        let zhvi = form.field("zhvi").unwrap();
        assert_eq!(zhvi.label, "zhvi");
        assert_eq!(
            zhvi.domain,
            FieldDomain::Number {
                min: None,
                max: None,
                integer: false
            }
        );
    }

    #[test]
    fn test_form_defaults_validate() {
        let form = Form::from_frame(&frame(), &labels()).unwrap();
        let record = form.defaults().unwrap();
        assert_eq!(record.category("year").unwrap(), "2010");
        assert_eq!(record.number("total_pop").unwrap(), 200.0);
    }

    #[test]
    fn test_form_fill_applies_overrides() {
        let form = Form::from_frame(&frame(), &labels()).unwrap();
        let record = form
            .fill([
                ("state", FeatureValue::from("TX")),
                ("year", FeatureValue::from(2012.0)),
                ("poverty_rate", FeatureValue::from(0.5)),
            ])
            .unwrap();
        assert_eq!(record.category("state").unwrap(), "TX");
        assert_eq!(record.category("year").unwrap(), "2012");
        assert_eq!(record.number("poverty_rate").unwrap(), 0.5);
    }

    #[test]
    fn test_form_fill_out_of_range() {
        let form = Form::from_frame(&frame(), &labels()).unwrap();

        match form.fill([("poverty_rate", FeatureValue::from(1.5))]) {
            Err(PipelineError::OutOfRange {
                feature, min, max, ..
            }) => {
                assert_eq!(feature, "poverty_rate");
                assert_eq!((min, max), (0.0, 1.0));
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }

        assert!(matches!(
            form.fill([("year", FeatureValue::from(2013.0))]),
            Err(PipelineError::OutOfRange { .. })
        ));
        assert!(matches!(
            form.fill([("total_pop", FeatureValue::from(-5.0))]),
            Err(PipelineError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_form_fill_rejects_fractional_count() {
        let form = Form::from_frame(&frame(), &labels()).unwrap();
        assert!(matches!(
            form.fill([("total_pop", FeatureValue::from(10.5))]),
            Err(PipelineError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_form_fill_unknown_option_and_field() {
        let form = Form::from_frame(&frame(), &labels()).unwrap();
        assert!(matches!(
            form.fill([("state", FeatureValue::from("Atlantis"))]),
            Err(PipelineError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            form.fill([("crime", FeatureValue::from(1.0))]),
            Err(PipelineError::UnknownFeature { .. })
        ));
    }

    #[test]
    fn test_form_parse_value() {
        let form = Form::from_frame(&frame(), &labels()).unwrap();
        assert_eq!(
            form.parse_value("poverty_rate", " 0.25").unwrap(),
            FeatureValue::Number(0.25)
        );
        assert_eq!(
            form.parse_value("year", "2011").unwrap(),
            FeatureValue::Category("2011".to_string())
        );
        assert!(form.parse_value("poverty_rate", "lots").is_err());
        assert!(form.parse_value("nope", "1").is_err());
    }

    #[test]
    fn test_form_year_label_override_validates() {
        let form = Form::from_frame(&frame(), &labels()).unwrap();
        let value = form.parse_value("year", "2011").unwrap();
        let record = form.fill([("year", value)]).unwrap();
        assert_eq!(record.category("year").unwrap(), "2011");
    }

    #[test]
    fn test_form_serializes_to_json() {
        let form = Form::from_frame(&frame(), &labels()).unwrap();
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["fields"][1]["domain"]["type"], "integer_range");
        assert_eq!(json["fields"][3]["domain"]["max"], 1.0);
    }
}
