//! The outbound request carrying a captured image.

use serde::{Deserialize, Serialize};

/// One named request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParam {
    /// Parameter name.
    pub name: String,
    /// Parameter value.
    pub value: String,
}

/// A partial-processing request for the server-side component model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AjaxRequest {
    /// Component that triggered the request.
    pub source: String,
    /// Space-separated components to process.
    pub process: String,
    /// Space-separated components to re-render, if any.
    pub update: Option<String>,
    /// Extra request parameters.
    pub params: Vec<RequestParam>,
}

impl AjaxRequest {
    /// Builds the request for a capture by widget `id`.
    ///
    /// The widget always processes itself; configured `process` ids are
    /// appended after it. The payload travels as `<id>_data`.
    pub fn for_capture(
        id: &str,
        process: Option<&str>,
        update: Option<&str>,
        payload: impl Into<String>,
    ) -> Self {
        let process = match process {
            Some(extra) => format!("{id} {extra}"),
            None => id.to_string(),
        };
        Self {
            source: id.to_string(),
            process,
            update: update.map(str::to_owned),
            params: vec![RequestParam {
                name: Self::data_param_name(id),
                value: payload.into(),
            }],
        }
    }

    /// Name of the parameter holding the payload for widget `id`.
    pub fn data_param_name(id: &str) -> String {
        format!("{id}_data")
    }

    /// Looks up a parameter value by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Form fields for posting the request to a faces endpoint.
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("javax.faces.partial.ajax".to_string(), "true".to_string()),
            ("javax.faces.source".to_string(), self.source.clone()),
            ("javax.faces.partial.execute".to_string(), self.process.clone()),
        ];
        if let Some(update) = &self.update {
            form.push(("javax.faces.partial.render".to_string(), update.clone()));
        }
        form.push((self.source.clone(), self.source.clone()));
        form.extend(self.params.iter().map(|p| (p.name.clone(), p.value.clone())));
        form
    }
}
