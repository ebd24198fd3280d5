use std::fmt;

/// Structural description of an element on the portal.
///
/// Stage logic never carries raw CSS strings; it builds one of these and the
/// driver renders it with [`Selector::to_css`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(String),
    Css(String),
    Attribute {
        base: String,
        name: String,
        value: String,
    },
}

impl Selector {
    pub fn id(id: impl Into<String>) -> Self {
        Selector::Id(id.into())
    }

    pub fn css(css: impl Into<String>) -> Self {
        Selector::Css(css.into())
    }

    pub fn attribute(
        base: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Selector::Attribute {
            base: base.into(),
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn to_css(&self) -> String {
        match self {
            Selector::Id(id) => format!("#{}", escape_ident(id)),
            Selector::Css(css) => css.clone(),
            Selector::Attribute { base, name, value } => {
                format!("{base}[{name}=\"{}\"]", escape_value(value))
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

fn escape_ident(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for ch in id.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}

fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
