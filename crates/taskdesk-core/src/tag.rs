use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTag {
    pub name: String,
    /// Derived from `name` when absent.
    #[serde(default)]
    pub slug: Option<String>,
}

impl CreateTag {
    pub fn validate(&self) -> Result<(), crate::TaskdeskError> {
        if self.name.trim().is_empty() {
            return Err(crate::TaskdeskError::InvalidInput(
                "tag name must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn slug(&self) -> String {
        match self.slug {
            Some(ref s) if !s.trim().is_empty() => slugify(s),
            _ => slugify(&self.name),
        }
    }
}

/// Lowercase ASCII slug: alphanumerics kept, runs of anything else
/// collapsed to a single hyphen.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;
    for c in input.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}
