use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::{CommandError, ParameterError};
use crate::overlay::models::Parameters;
use crate::page::html::{escape_attr, escape_text};
use crate::settings::{ParameterField, StoredParameters};

pub const TOOLBAR_ID: &str = "listing-overlay-toolbar";

const TOOLBAR_STYLE: &str = "position: fixed; bottom: 0; left: 0; width: 100%; \
    background-color: #333; color: white; padding: 10px; z-index: 9999; display: flex; \
    justify-content: space-between; align-items: center";

/// A numeric input holding raw user text until the bar is submitted.
#[derive(Debug, Clone)]
pub struct NumberInput {
    pub field: ParameterField,
    pub value: String,
}

impl NumberInput {
    fn parse(&self) -> Result<f64, ParameterError> {
        let raw = self.value.trim();
        let value = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ParameterError::NotANumber {
                field: self.field.key(),
                raw: raw.to_string(),
            })?;

        let bounds = self.field.bounds();
        if !bounds.contains(value) {
            return Err(ParameterError::OutOfRange {
                field: self.field.key(),
                value,
                min: bounds.min,
                max: bounds.max,
            });
        }
        Ok(value)
    }
}

/// Floating toolbar with the three tunable parameters and an update button.
#[derive(Debug, Clone)]
pub struct ControlBar {
    inputs: Vec<NumberInput>,
}

impl ControlBar {
    pub fn new(stored: &StoredParameters) -> Self {
        let inputs = ParameterField::ALL
            .iter()
            .map(|&field| NumberInput {
                field,
                value: stored.get(field).to_string(),
            })
            .collect();
        Self { inputs }
    }

    pub fn inputs(&self) -> &[NumberInput] {
        &self.inputs
    }

    pub fn set_input(&mut self, field: ParameterField, raw: &str) {
        if let Some(input) = self.inputs.iter_mut().find(|i| i.field == field) {
            input.value = raw.to_string();
        }
    }

    /// The button press: validates every input and returns the values to
    /// persist (percent) alongside the ones to compute with (fractions).
    pub fn submit(&self) -> Result<(StoredParameters, Parameters), ParameterError> {
        let mut stored = StoredParameters::default();
        for input in &self.inputs {
            stored.set(input.field, input.parse()?);
        }
        let params = stored.to_parameters()?;
        Ok((stored, params))
    }

    pub fn to_html(&self) -> String {
        let mut html = format!("<div id=\"{TOOLBAR_ID}\" style=\"{TOOLBAR_STYLE}\">");
        for input in &self.inputs {
            let bounds = input.field.bounds();
            let _ = write!(
                html,
                "{}: <input type=\"number\" name=\"{}\" value=\"{}\" min=\"{}\" max=\"{}\" step=\"{}\" \
                 style=\"margin-right: 10px; padding: 5px\">",
                escape_text(input.field.label()),
                input.field.key(),
                escape_attr(&input.value),
                bounds.min,
                bounds.max,
                bounds.step,
            );
        }
        html.push_str("<button type=\"button\" style=\"padding: 5px 10px\">Update Rates</button></div>");
        html
    }
}

/// Line-oriented edits to the control bar.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    Set(ParameterField, String),
    Update,
    Show,
    Quit,
}

impl FromStr for ControlCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err(CommandError::Unknown(String::new()));
        };

        let field = match verb.to_ascii_lowercase().as_str() {
            "update" => return Ok(Self::Update),
            "show" => return Ok(Self::Show),
            "quit" | "exit" => return Ok(Self::Quit),
            "interest" | "interestrate" => ParameterField::InterestRate,
            "clearance" | "clearancerate" => ParameterField::ClearanceRate,
            "factor" => ParameterField::Factor,
            _ => return Err(CommandError::Unknown(verb.to_string())),
        };

        let value = parts.next().ok_or(CommandError::MissingValue(field.key()))?;
        Ok(Self::Set(field, value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_mirror_stored_values() {
        let bar = ControlBar::new(&StoredParameters::default());
        let values: Vec<&str> = bar.inputs().iter().map(|i| i.value.as_str()).collect();
        assert_eq!(values, vec!["3.75", "1", "20"]);
    }

    #[test]
    fn submit_converts_rates_to_fractions() {
        let mut bar = ControlBar::new(&StoredParameters::default());
        bar.set_input(ParameterField::InterestRate, "4");
        bar.set_input(ParameterField::ClearanceRate, " 2.5 ");
        bar.set_input(ParameterField::Factor, "25");

        let (stored, params) = bar.submit().unwrap();
        assert_eq!(
            stored,
            StoredParameters {
                interest_rate: 4.0,
                clearance_rate: 2.5,
                factor: 25.0,
            }
        );
        assert_eq!(params, Parameters::new(0.04, 0.025, 25.0).unwrap());
    }

    #[test]
    fn out_of_range_input_is_rejected() {
        let mut bar = ControlBar::new(&StoredParameters::default());
        bar.set_input(ParameterField::Factor, "0");

        assert_eq!(
            bar.submit(),
            Err(ParameterError::OutOfRange {
                field: "factor",
                value: 0.0,
                min: 1.0,
                max: 100.0,
            })
        );
    }

    #[test]
    fn non_numeric_input_is_rejected() {
        let mut bar = ControlBar::new(&StoredParameters::default());
        bar.set_input(ParameterField::InterestRate, "viel");
        assert!(matches!(bar.submit(), Err(ParameterError::NotANumber { .. })));

        bar.set_input(ParameterField::InterestRate, "NaN");
        assert!(matches!(bar.submit(), Err(ParameterError::NotANumber { .. })));
    }

    #[test]
    fn toolbar_markup_carries_bounds() {
        let html = ControlBar::new(&StoredParameters::default()).to_html();

        assert!(html.starts_with(r#"<div id="listing-overlay-toolbar""#));
        assert!(html.contains(
            r#"Interest Rate: <input type="number" name="interestRate" value="3.75" min="0" max="100" step="0.01""#
        ));
        assert!(html.contains(r#"name="factor" value="20" min="1" max="100" step="1""#));
        assert!(html.contains(">Update Rates</button>"));
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            "interest 4.2".parse(),
            Ok(ControlCommand::Set(ParameterField::InterestRate, "4.2".into()))
        );
        assert_eq!(
            "Factor 30".parse(),
            Ok(ControlCommand::Set(ParameterField::Factor, "30".into()))
        );
        assert_eq!("update".parse(), Ok(ControlCommand::Update));
        assert_eq!("quit".parse(), Ok(ControlCommand::Quit));
        assert_eq!(
            "clearance".parse::<ControlCommand>(),
            Err(CommandError::MissingValue("clearanceRate"))
        );
        assert_eq!(
            "reset".parse::<ControlCommand>(),
            Err(CommandError::Unknown("reset".into()))
        );
    }
}
