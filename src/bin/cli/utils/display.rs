//! Display and output utilities for CLI commands
//!
//! Text output goes to stdout line by line; JSON output is one object per
//! invocation, built with [`JsonOutput`].

use serde_json::{Map, Value};

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("[OK] {}", message);
}

/// Print error message to stderr
pub fn print_error(message: &str) {
    eprintln!("[ERROR] {}", message);
}

/// Encode binary data as hex string
pub fn hex_encode(data: &[u8]) -> String {
    use std::fmt::Write;
    data.iter().fold(String::new(), |mut output, b| {
        let _ = write!(output, "{:02x}", b);
        output
    })
}

/// Render bytes as text, falling back to hex for non-UTF-8 data
pub fn format_value(value: &[u8]) -> String {
    match std::str::from_utf8(value) {
        Ok(s) => s.to_string(),
        Err(_) => format!("<binary: {}>", hex_encode(value)),
    }
}

/// Format a key-value pair for display
pub fn format_kv(key: &[u8], value: &[u8]) -> String {
    format!("{} -> {}", format_value(key), format_value(value))
}

/// JSON representation of a byte string: a string when it is valid
/// UTF-8, otherwise `{"hex": "..."}`
pub fn bytes_to_json(data: &[u8]) -> Value {
    match std::str::from_utf8(data) {
        Ok(s) => Value::String(s.to_string()),
        Err(_) => {
            let mut obj = Map::new();
            obj.insert("hex".to_string(), Value::String(hex_encode(data)));
            Value::Object(obj)
        }
    }
}

/// JSON output builder for structured CLI output
#[derive(Debug, Clone, Default)]
pub struct JsonOutput {
    fields: Map<String, Value>,
}

impl JsonOutput {
    /// Create a new JSON output builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string field
    pub fn add_str(&mut self, key: &str, value: &str) -> &mut Self {
        self.fields.insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    /// Add a byte-string field
    pub fn add_bytes(&mut self, key: &str, value: &[u8]) -> &mut Self {
        self.fields.insert(key.to_string(), bytes_to_json(value));
        self
    }

    /// Add an unsigned integer field
    pub fn add_uint(&mut self, key: &str, value: u64) -> &mut Self {
        self.fields.insert(key.to_string(), Value::from(value));
        self
    }

    /// Add a float field, or `null` when there is no value
    pub fn add_opt_float(&mut self, key: &str, value: Option<f64>) -> &mut Self {
        let value = value
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Add an optional string field, `null` when absent
    pub fn add_opt_str(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        let value = value.map(|s| Value::String(s.to_string())).unwrap_or(Value::Null);
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Add a boolean field
    pub fn add_bool(&mut self, key: &str, value: bool) -> &mut Self {
        self.fields.insert(key.to_string(), Value::Bool(value));
        self
    }

    /// Add an array of key-value records
    pub fn add_kv_array(&mut self, key: &str, pairs: &[(Vec<u8>, Vec<u8>)]) -> &mut Self {
        let array = pairs
            .iter()
            .map(|(k, v)| {
                let mut obj = Map::new();
                obj.insert("key".to_string(), bytes_to_json(k));
                obj.insert("value".to_string(), bytes_to_json(v));
                Value::Object(obj)
            })
            .collect();
        self.fields.insert(key.to_string(), Value::Array(array));
        self
    }

    /// Add nested object
    pub fn add_object(&mut self, key: &str, nested: JsonOutput) -> &mut Self {
        self.fields.insert(key.to_string(), Value::Object(nested.fields));
        self
    }

    /// Set the status field (common for all responses)
    pub fn status(&mut self, success: bool) -> &mut Self {
        self.add_str("status", if success { "success" } else { "error" })
    }

    /// Set an error message
    pub fn error(&mut self, message: &str) -> &mut Self {
        self.add_str("status", "error");
        self.add_str("error", message)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Print JSON output to stdout
    pub fn print(&self) {
        println!("{}", self.to_json());
    }
}

/// Create a success JSON response for `operation`
pub fn json_success(operation: &str) -> JsonOutput {
    let mut output = JsonOutput::new();
    output.status(true);
    output.add_str("operation", operation);
    output
}

/// Create an error JSON response
pub fn json_error(message: &str) -> JsonOutput {
    let mut output = JsonOutput::new();
    output.error(message);
    output
}
