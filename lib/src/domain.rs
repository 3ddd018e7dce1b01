//! The state-year crime feature set.
//!
//! Twenty-four features describe one US state in one year: the state, the
//! year, and 22 socio-economic indicators. The regression target is
//! `log10` of the total crime count.

use crate::error::Result;
use crate::form::{FieldLabel, ValueRange};
use crate::record::{FeatureValue, InputRecord};
use crate::schema::{FeatureSchema, FeatureSpec, FeatureKind};
use serde::{Deserialize, Serialize};

/// Feature names in model input order.
pub const FEATURES: [&str; 24] = [
    "state",
    "year",
    "total_pop",
    "white_pop",
    "black_pop",
    "hispanic_pop",
    "asian_pop",
    "native_pop",
    "islander_pop",
    "multi_race_pop",
    "median_income",
    "poverty_rate",
    "unemployment_rate",
    "unemployed_15_weeks",
    "labor_force_participation_rate",
    "hs_grad_rate",
    "bachelors_grad_rate",
    "zhvi",
    "crude_rate_suicide",
    "crude_rate_od",
    "youth_not_in_school",
    "youth_in_foster_care",
    "youth_living_in_poverty",
    "youth_school_poverty_interaction",
];

pub const TARGET: &str = "log_total_crime_count";

/// `state` categorical, `year` ordinal, everything else numeric.
pub fn crime_schema() -> Result<FeatureSchema> {
    FeatureSchema::new(
        FEATURES
            .iter()
            .map(|&name| {
                let kind = match name {
                    "state" => FeatureKind::Categorical,
                    "year" => FeatureKind::Ordinal,
                    _ => FeatureKind::Numeric,
                };
                FeatureSpec::new(name, kind)
            })
            .collect(),
    )
}

/// Form labels and ranges for every crime feature.
pub fn field_labels() -> Vec<FieldLabel> {
    use ValueRange::{Any, Count, Fraction};

    vec![
        FieldLabel::new("state", "Select State", Any),
        FieldLabel::new("year", "Select Year", Any),
        FieldLabel::new("total_pop", "Total Population", Count),
        FieldLabel::new("white_pop", "White Population (%)", Fraction),
        FieldLabel::new("black_pop", "Black Population (%)", Fraction),
        FieldLabel::new("hispanic_pop", "Hispanic Population (%)", Fraction),
        FieldLabel::new("asian_pop", "Asian Population (%)", Fraction),
        FieldLabel::new("native_pop", "Native Population (%)", Fraction),
        FieldLabel::new("islander_pop", "Islander Population (%)", Fraction),
        FieldLabel::new("multi_race_pop", "Multi-Race Population (%)", Fraction),
        FieldLabel::new("median_income", "Median Income", Count),
        FieldLabel::new("poverty_rate", "Poverty Rate (%)", Fraction),
        FieldLabel::new("unemployment_rate", "Unemployment Rate (%)", Fraction),
        FieldLabel::new("unemployed_15_weeks", "Unemployed 15 Weeks or Longer", Count),
        FieldLabel::new(
            "labor_force_participation_rate",
            "Labor Force Participation Rate (%)",
            Fraction,
        ),
        FieldLabel::new("hs_grad_rate", "High School Graduation Rate (%)", Fraction),
        FieldLabel::new("bachelors_grad_rate", "Bachelor's Graduation Rate (%)", Fraction),
        FieldLabel::new("zhvi", "Zillow Home Value Index (ZHVI)", Count),
        FieldLabel::new("crude_rate_suicide", "Crude Rate of Suicide", Count),
        FieldLabel::new("crude_rate_od", "Crude Rate of Overdose", Count),
        FieldLabel::new("youth_not_in_school", "Youth Not in School", Count),
        FieldLabel::new("youth_in_foster_care", "Youth in Foster Care", Count),
        FieldLabel::new("youth_living_in_poverty", "Youth Living in Poverty", Count),
        FieldLabel::new(
            "youth_school_poverty_interaction",
            "Youth School-Poverty Interaction",
            Count,
        ),
    ]
}

/// One fully typed state-year observation.
///
/// Deserializes from a JSON object or a CSV row with the [`FEATURES`]
/// headers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrimeFeatures {
    pub state: String,
    pub year: i64,
    pub total_pop: f64,
    pub white_pop: f64,
    pub black_pop: f64,
    pub hispanic_pop: f64,
    pub asian_pop: f64,
    pub native_pop: f64,
    pub islander_pop: f64,
    pub multi_race_pop: f64,
    pub median_income: f64,
    pub poverty_rate: f64,
    pub unemployment_rate: f64,
    pub unemployed_15_weeks: f64,
    pub labor_force_participation_rate: f64,
    pub hs_grad_rate: f64,
    pub bachelors_grad_rate: f64,
    pub zhvi: f64,
    pub crude_rate_suicide: f64,
    pub crude_rate_od: f64,
    pub youth_not_in_school: f64,
    pub youth_in_foster_care: f64,
    pub youth_living_in_poverty: f64,
    pub youth_school_poverty_interaction: f64,
}

impl CrimeFeatures {
    /// `(name, value)` pairs in [`FEATURES`] order.
    pub fn values(&self) -> Vec<(&'static str, FeatureValue)> {
        let numbers = [
            self.total_pop,
            self.white_pop,
            self.black_pop,
            self.hispanic_pop,
            self.asian_pop,
            self.native_pop,
            self.islander_pop,
            self.multi_race_pop,
            self.median_income,
            self.poverty_rate,
            self.unemployment_rate,
            self.unemployed_15_weeks,
            self.labor_force_participation_rate,
            self.hs_grad_rate,
            self.bachelors_grad_rate,
            self.zhvi,
            self.crude_rate_suicide,
            self.crude_rate_od,
            self.youth_not_in_school,
            self.youth_in_foster_care,
            self.youth_living_in_poverty,
            self.youth_school_poverty_interaction,
        ];

        let mut out = Vec::with_capacity(FEATURES.len());
        out.push((FEATURES[0], FeatureValue::Category(self.state.clone())));
        out.push((FEATURES[1], FeatureValue::from(self.year)));
        out.extend(
            FEATURES[2..]
                .iter()
                .zip(numbers)
                .map(|(&name, n)| (name, FeatureValue::Number(n))),
        );
        out
    }

    pub fn to_record(&self, schema: &FeatureSchema) -> Result<InputRecord> {
        InputRecord::new(schema, self.values())
    }
}
