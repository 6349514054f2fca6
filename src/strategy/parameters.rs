use crate::error::ParameterError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Default value of a declared parameter; the variant is its implied numeric type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ParameterValue {
    Integer(i64),
    Decimal(f64),
}

impl ParameterValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            ParameterValue::Integer(v) => *v as f64,
            ParameterValue::Decimal(v) => *v,
        }
    }

    /// Same numeric type as `self`, carrying `value`
    fn with_value(&self, name: &str, value: f64) -> Result<Self, ParameterError> {
        if !value.is_finite() {
            return Err(ParameterError::OutOfRange {
                name: name.to_string(),
                value,
                reason: "must be a finite number",
            });
        }

        match self {
            ParameterValue::Integer(_) => {
                if value.fract() != 0.0 {
                    return Err(ParameterError::NotAnInteger {
                        name: name.to_string(),
                        value,
                    });
                }
                Ok(ParameterValue::Integer(value as i64))
            }
            ParameterValue::Decimal(_) => Ok(ParameterValue::Decimal(value)),
        }
    }
}

/// A named, typed strategy input
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputParameter {
    pub name: String,
    pub default: ParameterValue,
}

impl InputParameter {
    pub fn new(name: &str, default: ParameterValue) -> Self {
        Self {
            name: name.to_string(),
            default,
        }
    }
}

/// Ordered parameter schema declared by a strategy
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParameterList {
    parameters: Vec<InputParameter>,
}

impl ParameterList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, parameter: InputParameter) {
        self.parameters.push(parameter);
    }

    pub fn get(&self, name: &str) -> Option<&InputParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputParameter> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Apply overrides on top of the declared defaults
    ///
    /// Every override must name a declared parameter, and values for
    /// integer parameters must be whole numbers.
    pub fn resolve(
        &self,
        overrides: &HashMap<String, f64>,
    ) -> Result<ResolvedParameters, ParameterError> {
        if let Some(unknown) = overrides.keys().find(|name| self.get(name).is_none()) {
            return Err(ParameterError::Unknown(unknown.clone()));
        }

        let mut values = BTreeMap::new();
        for parameter in &self.parameters {
            let value = match overrides.get(&parameter.name) {
                Some(&value) => parameter.default.with_value(&parameter.name, value)?,
                None => parameter.default,
            };
            values.insert(parameter.name.clone(), value);
        }

        Ok(ResolvedParameters { values })
    }

    /// Resolve with no overrides
    pub fn defaults(&self) -> ResolvedParameters {
        let values = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.default))
            .collect();
        ResolvedParameters { values }
    }
}

/// Final parameter values handed to `Strategy::initialize`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResolvedParameters {
    values: BTreeMap<String, ParameterValue>,
}

impl ResolvedParameters {
    pub fn get(&self, name: &str) -> Result<ParameterValue, ParameterError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| ParameterError::Missing(name.to_string()))
    }

    pub fn get_f64(&self, name: &str) -> Result<f64, ParameterError> {
        self.get(name).map(|v| v.as_f64())
    }

    /// Integer parameter that must be at least 1
    pub fn get_period(&self, name: &str) -> Result<usize, ParameterError> {
        let value = self.get_f64(name)?;
        if value < 1.0 || value.fract() != 0.0 {
            return Err(ParameterError::OutOfRange {
                name: name.to_string(),
                value,
                reason: "must be a positive integer",
            });
        }
        Ok(value as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParameterValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

/// Parse a `NAME=VALUE` override as given on the command line
pub fn parse_override(raw: &str) -> Result<(String, f64), ParameterError> {
    let (name, value) = raw
        .rsplit_once('=')
        .ok_or_else(|| ParameterError::MalformedOverride(raw.to_string()))?;

    let name = name.trim();
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| ParameterError::MalformedOverride(raw.to_string()))?;

    if name.is_empty() {
        return Err(ParameterError::MalformedOverride(raw.to_string()));
    }

    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ParameterList {
        let mut list = ParameterList::new();
        list.add(InputParameter::new("Period", ParameterValue::Integer(20)));
        list.add(InputParameter::new("Level", ParameterValue::Decimal(51.0)));
        list
    }

    #[test]
    fn test_defaults_without_overrides() {
        let resolved = schema().resolve(&HashMap::new()).unwrap();
        assert_eq!(resolved.get("Period"), Ok(ParameterValue::Integer(20)));
        assert_eq!(resolved.get_f64("Level"), Ok(51.0));
        assert_eq!(resolved, schema().defaults());
    }

    #[test]
    fn test_override_applied() {
        let overrides = HashMap::from([("Level".to_string(), 60.5)]);
        let resolved = schema().resolve(&overrides).unwrap();
        assert_eq!(resolved.get_f64("Level"), Ok(60.5));
        assert_eq!(resolved.get_period("Period"), Ok(20));
    }

    #[test]
    fn test_unknown_override_rejected() {
        let overrides = HashMap::from([("Nope".to_string(), 1.0)]);
        let err = schema().resolve(&overrides).unwrap_err();
        assert_eq!(err, ParameterError::Unknown("Nope".to_string()));
    }

    #[test]
    fn test_integer_parameter_rejects_fraction() {
        let overrides = HashMap::from([("Period".to_string(), 2.5)]);
        let err = schema().resolve(&overrides).unwrap_err();
        assert!(matches!(err, ParameterError::NotAnInteger { .. }));
    }

    #[test]
    fn test_non_finite_rejected() {
        let overrides = HashMap::from([("Level".to_string(), f64::NAN)]);
        let err = schema().resolve(&overrides).unwrap_err();
        assert!(matches!(err, ParameterError::OutOfRange { .. }));
    }

    #[test]
    fn test_get_period_rejects_zero() {
        let overrides = HashMap::from([("Period".to_string(), 0.0)]);
        let resolved = schema().resolve(&overrides).unwrap();
        assert!(resolved.get_period("Period").is_err());
    }

    #[test]
    fn test_missing_parameter() {
        let resolved = ResolvedParameters::default();
        assert_eq!(
            resolved.get("Period"),
            Err(ParameterError::Missing("Period".to_string()))
        );
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("Stochastic Period=30"),
            Ok(("Stochastic Period".to_string(), 30.0))
        );
        assert_eq!(
            parse_override("Stochastic %D Buy signal trigger level = 45.5"),
            Ok(("Stochastic %D Buy signal trigger level".to_string(), 45.5))
        );
        assert!(parse_override("no value").is_err());
        assert!(parse_override("=3").is_err());
        assert!(parse_override("x=abc").is_err());
    }
}
