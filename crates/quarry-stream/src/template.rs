//! Filter templates with `{name}` placeholders.

use std::collections::BTreeMap;

use quarry_core::errors::{QuarryError, QuarryResult};

/// A filter expression with named placeholders, rendered against the
/// stream's current query parameters on every poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    source: String,
}

impl QueryTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of the placeholders, in order of appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.source.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    names.push(&after[..close]);
                    rest = &after[close + 1..];
                }
                None => break,
            }
        }
        names
    }

    /// Substitute every `{name}`. A placeholder without a value is an error.
    /// Without parameters the template is used verbatim.
    pub fn render(&self, params: &BTreeMap<String, String>) -> QuarryResult<String> {
        if params.is_empty() {
            return Ok(self.source.clone());
        }
        let mut rendered = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();
        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                return Err(self.invalid("unclosed `{`"));
            };
            let name = &after[..close];
            let value = params
                .get(name)
                .ok_or_else(|| self.invalid(format!("no value for placeholder `{name}`")))?;
            rendered.push_str(value);
            rest = &after[close + 1..];
        }
        rendered.push_str(rest);
        Ok(rendered)
    }

    fn invalid(&self, reason: impl Into<String>) -> QuarryError {
        QuarryError::InvalidQuery {
            query: self.source.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn renders_named_placeholders() {
        let template = QueryTemplate::new("status:Validated AND metadata.batch_id:{batch_id}");
        assert_eq!(template.placeholders(), vec!["batch_id"]);
        assert_eq!(
            template.render(&params(&[("batch_id", "7")])).unwrap(),
            "status:Validated AND metadata.batch_id:7"
        );
    }

    #[test]
    fn missing_value_is_an_error() {
        let template = QueryTemplate::new("metadata.batch_id:{batch_id} AND annotation:{label}");
        let err = template.render(&params(&[("batch_id", "1")])).unwrap_err();
        assert!(err.to_string().contains("label"));
    }

    #[test]
    fn no_params_uses_template_verbatim() {
        let template = QueryTemplate::new("status:Validated");
        assert_eq!(template.render(&BTreeMap::new()).unwrap(), "status:Validated");
    }
}
