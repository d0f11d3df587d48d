use anyhow::{Result, anyhow};
use fancy_regex::Regex;
use log::debug;
use serde_json::{Map, Value};

use crate::extractor::extract::YtExtractor;

pub trait ExtractorJsonHandle {
    fn find_key(&self, value: &Value, target: &str) -> Option<String>;
    /// Finds `start_pattern` in `html` and parses the balanced JSON object that follows it.
    fn search_json(
        &self,
        start_pattern: &str,
        html: &str,
    ) -> Result<Option<Map<String, Value>>>;
}

impl ExtractorJsonHandle for YtExtractor {
    fn find_key(&self, value: &Value, target: &str) -> Option<String> {
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    if k == target {
                        if let Some(s) = v.as_str() {
                            return Some(s.to_string());
                        }
                    } else if let Some(found) = self.find_key(v, target) {
                        return Some(found);
                    }
                }
            }
            Value::Array(arr) => {
                for v in arr {
                    if let Some(found) = self.find_key(v, target) {
                        return Some(found);
                    }
                }
            }
            _ => {}
        }
        None
    }

    fn search_json(
        &self,
        start_pattern: &str,
        html: &str,
    ) -> Result<Option<Map<String, Value>>> {
        let re_start =
            Regex::new(start_pattern).map_err(|e| anyhow!("Invalid start regex: {e}"))?;

        let start_pos = match re_start.find(html)? {
            Some(m) => m.end(),
            None => return Ok(None),
        };

        let rest = &html[start_pos..];
        let mut json_start = None;
        let mut depth = 0usize;
        let mut in_str = false;
        let mut escape = false;

        for (i, c) in rest.char_indices() {
            let Some(begin) = json_start else {
                if c == '{' {
                    json_start = Some(i);
                    depth = 1;
                } else if !c.is_whitespace() {
                    return Ok(None);
                }
                continue;
            };

            if in_str {
                if escape {
                    escape = false;
                } else if c == '\\' {
                    escape = true;
                } else if c == '"' {
                    in_str = false;
                }
                continue;
            }

            match c {
                '"' => in_str = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let json_str = &rest[begin..=i];
                        return match serde_json::from_str(json_str) {
                            Ok(parsed) => Ok(Some(parsed)),
                            Err(e) => {
                                debug!("Failed to parse JSON after \"{start_pattern}\": {e}");
                                Ok(None)
                            }
                        };
                    }
                }
                _ => {}
            }
        }

        Ok(None)
    }
}
