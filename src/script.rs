//! Script assembly: console capture, serialized props, then the bundle.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// Props handed to the bundle; insertion order is kept.
pub type Props = Map<String, Value>;

/// Swaps the console methods for a recorder so incidental logging never
/// reaches stdout. `stdout`/`stderr` keep the original writers.
pub const CONSOLE_POLYFILL: &str = "\
const stdout = console.log;
const stderr = console.error;

const recordedLogs = [];

['log', 'info', 'debug', 'warn', 'error'].forEach(level => {
    console[level] = (...args) => {
        recordedLogs.push({ level: level, args: args });
    }
});
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStyle {
    /// `user_id` becomes `userId`.
    #[default]
    LowerCamel,
    /// Keys are embedded exactly as given.
    Preserve,
}

impl KeyStyle {
    pub fn apply(self, key: &str) -> String {
        match self {
            Self::LowerCamel => lower_camel(key),
            Self::Preserve => key.to_string(),
        }
    }
}

/// Rails-style `camelize` with a lowercase first letter: after every `_` the
/// run of ASCII letters and digits is capitalized (`user_ID` -> `userId`).
pub fn lower_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut segments = key.split('_');
    if let Some(head) = segments.next() {
        out.push_str(head);
    }
    for seg in segments {
        let run = seg
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(seg.len());
        let (word, rest) = seg.split_at(run);
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(&chars.as_str().to_ascii_lowercase());
        }
        out.push_str(rest);
    }

    let mut chars = out.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// JSON with the characters that could close a surrounding markup or
/// script context escaped. Only valid inside JSON string literals, which is
/// the only place these characters can occur in serializer output.
pub fn encode_json(value: &Value) -> serde_json::Result<String> {
    let raw = serde_json::to_string(value)?;
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    Ok(out)
}

/// One render's executable script.
#[derive(Debug, Clone)]
pub struct AssembledScript {
    contents: Vec<u8>,
    file_name: String,
    persist_to: Option<PathBuf>,
}

impl AssembledScript {
    /// Wrap already-built script bytes.
    pub fn from_bytes(file_name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self { contents, file_name: file_name.into(), persist_to: None }
    }

    pub fn with_persist_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_to = Some(path.into());
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.contents
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn persist_to(&self) -> Option<&Path> {
        self.persist_to.as_deref()
    }

    /// (`stem`, `.ext`) for naming the transient copy.
    pub fn temp_affixes(&self) -> (String, String) {
        let p = Path::new(&self.file_name);
        let stem = p
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle".to_string());
        let ext = p
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (stem, ext)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptAssembler {
    key_style: KeyStyle,
}

impl ScriptAssembler {
    pub fn new(key_style: KeyStyle) -> Self {
        Self { key_style }
    }

    pub fn props_statement(&self, props: &Props) -> serde_json::Result<String> {
        let js_props: Props = props
            .iter()
            .map(|(k, v)| (self.key_style.apply(k), v.clone()))
            .collect();
        Ok(format!("const serverProps = {};\n\n", encode_json(&Value::Object(js_props))?))
    }

    pub fn assemble(&self, file_name: &str, bundle: &[u8], props: &Props) -> serde_json::Result<AssembledScript> {
        let props_statement = self.props_statement(props)?;

        let mut contents = Vec::with_capacity(CONSOLE_POLYFILL.len() + props_statement.len() + bundle.len() + 2);
        contents.extend_from_slice(CONSOLE_POLYFILL.as_bytes());
        contents.extend_from_slice(b"\n\n");
        contents.extend_from_slice(props_statement.as_bytes());
        contents.extend_from_slice(bundle);

        Ok(AssembledScript::from_bytes(file_name, contents))
    }
}
