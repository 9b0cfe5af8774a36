use std::path::Path;

use indexmap::IndexMap;

#[derive(Debug, thiserror::Error)]
pub enum IniError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

impl IniError {
    pub fn is_not_found(&self) -> bool {
        match self {
            IniError::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
        }
    }
}

#[derive(Debug, PartialEq)]
enum IniLine<'a> {
    Section(&'a str),
    Entry { key: &'a str, value: &'a str },
}

fn parse_line(line: &str) -> Option<IniLine<'_>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
        return None;
    }

    if let Some(section) = line.strip_prefix('[') {
        let Some(section) = section.strip_suffix(']') else {
            tracing::warn!("Unterminated section header: {line}");
            return None;
        };
        return Some(IniLine::Section(section.trim()));
    }

    let Some((key, value)) = line.split_once('=') else {
        tracing::warn!("Ignoring line without a value: {line}");
        return None;
    };

    Some(IniLine::Entry {
        key: key.trim(),
        value: value.trim(),
    })
}

/// A sectioned `Key=Value` document. Section and key order is kept as inserted.
///
/// Entries that appear before the first section header belong to the section named `""`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IniFile {
    sections: IndexMap<String, IndexMap<String, String>>,
}

impl IniFile {
    pub fn parse(s: &str) -> Self {
        let mut file = Self::default();
        let mut section = String::new();

        for line in s.lines().filter_map(parse_line) {
            match line {
                IniLine::Section(name) => {
                    section = name.to_string();
                    file.sections.entry(section.clone()).or_default();
                }
                IniLine::Entry { key, value } => file.set_value(key, value, &section),
            }
        }

        file
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, IniError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::parse(&data))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), IniError> {
        std::fs::write(path.as_ref(), self.to_string())?;
        Ok(())
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Section names in file order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Entries of `section` in file order. Empty if the section does not exist.
    pub fn entries<'a>(&'a self, section: &str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.sections
            .get(section)
            .into_iter()
            .flat_map(|entries| entries.iter())
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn value(&self, key: &str, section: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    pub fn get_u32(&self, key: &str, section: &str) -> Option<u32> {
        self.value(key, section)?.parse().ok()
    }

    pub fn get_bool(&self, key: &str, section: &str) -> Option<bool> {
        let value = self.value(key, section)?;
        if ["true", "yes", "on", "1"]
            .iter()
            .any(|t| value.eq_ignore_ascii_case(t))
        {
            Some(true)
        } else if ["false", "no", "off", "0"]
            .iter()
            .any(|f| value.eq_ignore_ascii_case(f))
        {
            Some(false)
        } else {
            None
        }
    }

    pub fn set_value(&mut self, key: &str, value: impl ToString, section: &str) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }
}

impl std::fmt::Display for IniFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Section-less entries have to come before the first header.
        let mut first = true;
        if let Some(entries) = self.sections.get("") {
            for (key, value) in entries {
                writeln!(f, "{key}={value}")?;
            }
            first = entries.is_empty();
        }

        for (section, entries) in self.sections.iter().filter(|(name, _)| !name.is_empty()) {
            if !first {
                writeln!(f)?;
            }
            first = false;

            writeln!(f, "[{section}]")?;
            for (key, value) in entries {
                writeln!(f, "{key}={value}")?;
            }
        }
        Ok(())
    }
}
