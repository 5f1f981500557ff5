//! Font Validator (spec section 4.7): schema-checks a parsed [`Value`]
//! tree in place and collects every violation with its path context
//! (e.g. `MyKit/snare/v64/r1/peak`), rather than stopping at the first.
//!
//! `include` files are resolved and validated here too (spec section 9's
//! Open Question, decided "implemented" — see `DESIGN.md`): an
//! instrument's `include` field names a file parsed with the same
//! lexer/parser grammar, rooted at a `velocities` array, and spliced into
//! the tree as if it had been written inline.

use std::fs;
use std::path::Path;

use crate::error::FontError;
use crate::number::EngrNum;

use super::parser;
use super::value::Value;

/// Accumulates validator errors. The validator never stops at the first
/// failure — it logs every violation with a `/`-joined path, then
/// succeeds iff the log is empty.
#[derive(Debug, Default)]
pub struct ValidationLog {
    pub errors: Vec<FontError>,
}

impl ValidationLog {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, err: FontError) {
        self.errors.push(err);
    }
}

fn velocity_code(name: &str) -> Option<u8> {
    let digits = name.strip_prefix('v')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u16>().ok().filter(|&v| v <= 127).map(|v| v as u8)
}

/// Validate (and, for string-typed numerics, coerce in place) an entire
/// font document. `base_dir` anchors `include` file resolution.
pub fn validate(tree: &mut Value, base_dir: &Path) -> ValidationLog {
    let mut log = ValidationLog::default();
    let Some(kits) = tree.as_object() else {
        log.push(FontError::InstrumentsMissing { path: String::new() });
        return log;
    };
    // Value::as_object borrows `tree` immutably; re-collect owned names so
    // we can re-borrow mutably per kit below.
    let kit_names: Vec<String> = kits.iter().map(|(k, _)| k.clone()).collect();

    for name in kit_names {
        let Value::Object(top) = tree else { unreachable!() };
        let kit_value = top.iter_mut().find(|(k, _)| k == &name).map(|(_, v)| v).unwrap();
        validate_kit(&name, kit_value, base_dir, &mut log);
    }
    log
}

fn validate_kit(kit_path: &str, kit: &mut Value, base_dir: &Path, log: &mut ValidationLog) {
    let Some(instruments) = kit.get("instruments").cloned() else {
        log.push(FontError::InstrumentsMissing { path: kit_path.to_string() });
        return;
    };
    let Some(members) = instruments.as_object() else {
        log.push(FontError::InstrumentsMissing { path: kit_path.to_string() });
        return;
    };
    let drum_names: Vec<String> = members.iter().map(|(k, _)| k.clone()).collect();

    let Value::Object(kit_members) = kit else { unreachable!() };
    let instruments_mut = kit_members
        .iter_mut()
        .find(|(k, _)| k == "instruments")
        .map(|(_, v)| v)
        .unwrap();
    let Value::Object(drums) = instruments_mut else { unreachable!() };

    for drum_name in drum_names {
        let path = format!("{kit_path}/{drum_name}");
        let drum = drums.iter_mut().find(|(k, _)| k == &drum_name).map(|(_, v)| v).unwrap();
        validate_drum(&path, drum, base_dir, log);
    }
}

fn validate_drum(path: &str, drum: &mut Value, base_dir: &Path, log: &mut ValidationLog) {
    match drum.get("note") {
        None => log.push(FontError::NoteMissing { path: path.to_string() }),
        Some(v) => match coerce_number(v) {
            Some(n) => {
                let x = n.x();
                if x.fract() != 0.0 || !(0.0..=127.0).contains(&x) {
                    log.push(FontError::NoteOutOfRange {
                        path: path.to_string(),
                        value: x,
                    });
                }
            }
            None => log.push(FontError::ExpectedNumber {
                path: format!("{path}/note"),
                found: v.kind_name().to_string(),
            }),
        },
    }

    let include_name = drum.get("include").and_then(Value::as_str).map(str::to_string);

    if let Some(include_name) = include_name {
        match load_include(base_dir, &include_name) {
            Ok(velocities) => {
                if let Value::Object(members) = drum {
                    members.push(("velocities".to_string(), velocities));
                } else {
                    unreachable!("drum is always an Object once reached here");
                }
            }
            Err(reason) => log.push(FontError::IncludeFailed {
                path: path.to_string(),
                file: include_name,
                reason,
            }),
        }
    }

    let Some(velocities) = drum.get("velocities") else {
        log.push(FontError::RobinsMissing { path: path.to_string() });
        return;
    };
    let Some(layer_elements) = velocities.as_array() else {
        log.push(FontError::RobinsMissing { path: path.to_string() });
        return;
    };

    // Each element is `vNN = { ... }` (spec section 6): a NameValue whose
    // name is the velocity code and whose value is the layer object.
    let layer_names: Vec<Option<String>> = layer_elements
        .iter()
        .map(|v| match v {
            Value::NameValue(name, _) => Some(name.clone()),
            _ => None,
        })
        .collect();

    let Value::Object(drum_members) = drum else { unreachable!() };
    let velocities_mut = drum_members
        .iter_mut()
        .find(|(k, _)| k == "velocities")
        .map(|(_, v)| v)
        .unwrap();
    let Value::Array(layer_values) = velocities_mut else { unreachable!() };

    let mut seen_codes = Vec::new();
    for (i, layer_name) in layer_names.into_iter().enumerate() {
        let Some(layer_name) = layer_name else {
            log.push(FontError::InvalidVelocityCode {
                path: path.to_string(),
                name: format!("<element {i}>"),
            });
            continue;
        };
        let layer_path = format!("{path}/{layer_name}");
        match velocity_code(&layer_name) {
            Some(code) => {
                if seen_codes.contains(&code) {
                    log.push(FontError::DuplicateVelocityCode {
                        path: path.to_string(),
                        code,
                    });
                } else {
                    seen_codes.push(code);
                }
            }
            None => log.push(FontError::InvalidVelocityCode {
                path: path.to_string(),
                name: layer_name.clone(),
            }),
        }
        let Value::NameValue(_, layer) = &mut layer_values[i] else { unreachable!() };
        validate_layer(&layer_path, layer, log);
    }
}

fn validate_layer(path: &str, layer: &mut Value, log: &mut ValidationLog) {
    let Some(robins) = layer.get("robins").and_then(Value::as_array) else {
        log.push(FontError::RobinsMissing { path: path.to_string() });
        return;
    };
    if robins.is_empty() {
        log.push(FontError::RobinsMissing { path: path.to_string() });
        return;
    }

    let Value::Object(members) = layer else { unreachable!() };
    let robins_mut = members.iter_mut().find(|(k, _)| k == "robins").map(|(_, v)| v).unwrap();
    let Value::Array(robin_elements) = robins_mut else { unreachable!() };

    // Each element is `rN = { ... }` or a bare `{ ... }`; the name (if
    // any) is cosmetic, so only the wrapped object is validated.
    for (i, element) in robin_elements.iter_mut().enumerate() {
        let robin_path = format!("{path}/r{}", i + 1);
        let robin = match element {
            Value::NameValue(_, boxed) => boxed.as_mut(),
            other => other,
        };
        validate_robin(&robin_path, robin, log);
    }
}

fn validate_robin(path: &str, robin: &mut Value, log: &mut ValidationLog) {
    if robin.get("fname").and_then(Value::as_str).is_none() {
        log.push(FontError::FnameMissing { path: path.to_string() });
    }

    for field in ["peak", "rms"] {
        let Some(raw) = robin.get(field).cloned() else {
            continue;
        };
        match coerce_number(&raw) {
            Some(n) => {
                let x = n.x();
                if !(x > 0.0 && x <= 1.0) {
                    log.push(FontError::RatioOutOfRange {
                        path: format!("{path}/{field}"),
                        value: x,
                    });
                }
                if matches!(raw, Value::QuotedString(_) | Value::UnquotedString(_)) {
                    replace_field(robin, field, Value::Number(n));
                }
            }
            None => log.push(FontError::ExpectedNumber {
                path: format!("{path}/{field}"),
                found: raw.kind_name().to_string(),
            }),
        }
    }
}

fn replace_field(object: &mut Value, field: &str, new_value: Value) {
    if let Value::Object(members) = object {
        if let Some((_, v)) = members.iter_mut().find(|(k, _)| k == field) {
            *v = new_value;
        }
    }
}

/// A numeric value is already a `Number`, or a string that itself parses
/// as one (spec section 4.7's in-place string-to-number coercion).
fn coerce_number(value: &Value) -> Option<EngrNum> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::QuotedString(s) | Value::UnquotedString(s) => {
            let traits = crate::number::scan(s.trim())?;
            if traits.end != s.trim().len() {
                return None;
            }
            EngrNum::parse(s.trim(), &traits, 0, 0).ok()
        }
        _ => None,
    }
}

/// Parse and unwrap a drum-scoped include file. Its top level is a single
/// moniker name-value pair (`Dfxi = { path = ..., velocities = [...] }`,
/// mirroring the main font's `Dfx = {...}`); this returns just the
/// `velocities` array, ready to be spliced into the including drum as-is.
fn load_include(base_dir: &Path, file_name: &str) -> Result<Value, String> {
    let full_path = base_dir.join(file_name);
    let text = fs::read_to_string(&full_path).map_err(|e| e.to_string())?;
    let parsed = parser::parse(&text).map_err(|e| e.to_string())?;

    let Value::Object(members) = &parsed else {
        return Err("include file must be a single name-value pair at the top level".to_string());
    };
    let Some((_, moniker_value)) = members.first() else {
        return Err("include file is empty".to_string());
    };

    moniker_value
        .get("velocities")
        .cloned()
        .ok_or_else(|| "include file is missing a required 'velocities' array".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Value {
        parser::parse(src).unwrap()
    }

    #[test]
    fn accepts_a_well_formed_kit() {
        let mut tree = parse(
            r#"{
                MyKit = {
                    instruments = {
                        snare = {
                            note = 38,
                            velocities = [
                                v64 = { robins = [ { fname = "a.wav", peak = "0.9" } ] }
                            ]
                        }
                    }
                }
            }"#,
        );
        let log = validate(&mut tree, Path::new("."));
        assert!(log.is_ok(), "{:?}", log.errors);
    }

    #[test]
    fn rejects_invalid_velocity_code() {
        let mut tree = parse(
            r#"{
                MyKit = {
                    instruments = {
                        snare = {
                            note = 38,
                            velocities = [ v128 = { robins = [ { fname = "a.wav" } ] } ]
                        }
                    }
                }
            }"#,
        );
        let log = validate(&mut tree, Path::new("."));
        assert!(log.errors.iter().any(|e| matches!(e, FontError::InvalidVelocityCode { .. })));
    }

    #[test]
    fn rejects_missing_note() {
        let mut tree = parse(
            r#"{
                MyKit = {
                    instruments = {
                        snare = { velocities = [ v64 = { robins = [ { fname = "a.wav" } ] } ] }
                    }
                }
            }"#,
        );
        let log = validate(&mut tree, Path::new("."));
        assert!(log.errors.iter().any(|e| matches!(e, FontError::NoteMissing { .. })));
    }

    #[test]
    fn coerces_quoted_ratio_string_to_number_in_place() {
        let mut tree = parse(
            r#"{
                MyKit = {
                    instruments = {
                        snare = {
                            note = 38,
                            velocities = [
                                v64 = { robins = [ { fname = "a.wav", peak = "-6dB" } ] }
                            ]
                        }
                    }
                }
            }"#,
        );
        let log = validate(&mut tree, Path::new("."));
        assert!(log.is_ok(), "{:?}", log.errors);
        let peak = tree
            .get("MyKit")
            .unwrap()
            .get("instruments")
            .unwrap()
            .get("snare")
            .unwrap()
            .get("velocities")
            .unwrap()
            .get("v64")
            .unwrap()
            .get("robins")
            .unwrap()
            .as_array()
            .unwrap()[0]
            .get("peak")
            .unwrap();
        assert!(matches!(peak, Value::Number(_)));
    }

    #[test]
    fn rejects_out_of_range_peak() {
        let mut tree = parse(
            r#"{
                MyKit = {
                    instruments = {
                        snare = {
                            note = 38,
                            velocities = [
                                v64 = { robins = [ { fname = "a.wav", peak = 1.5 } ] }
                            ]
                        }
                    }
                }
            }"#,
        );
        let log = validate(&mut tree, Path::new("."));
        assert!(log.errors.iter().any(|e| matches!(e, FontError::RatioOutOfRange { .. })));
    }

    #[test]
    fn rejects_empty_robins_array() {
        let mut tree = parse(
            r#"{
                MyKit = {
                    instruments = {
                        snare = { note = 38, velocities = [ v64 = { robins = [] } ] }
                    }
                }
            }"#,
        );
        let log = validate(&mut tree, Path::new("."));
        assert!(log.errors.iter().any(|e| matches!(e, FontError::RobinsMissing { .. })));
    }

    #[test]
    fn include_file_splices_velocities_into_drum() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("snare.dfxi"),
            r#"Dfxi = {
                velocities = [
                    v64 = { robins = [ { fname = "a.wav" } ] }
                ]
            }"#,
        )
        .unwrap();

        let mut tree = parse(
            r#"{
                MyKit = {
                    instruments = {
                        snare = { note = 38, include = "snare.dfxi" }
                    }
                }
            }"#,
        );
        let log = validate(&mut tree, dir.path());
        assert!(log.is_ok(), "{:?}", log.errors);

        let velocities = tree
            .get("MyKit")
            .unwrap()
            .get("instruments")
            .unwrap()
            .get("snare")
            .unwrap()
            .get("velocities")
            .unwrap();
        let layer = velocities.as_array().unwrap();
        assert_eq!(layer.len(), 1);
        // the spliced value is the `velocities` array directly, not a
        // document re-wrapped around another `velocities` key.
        assert!(velocities.get("velocities").is_none());
        assert_eq!(velocities.get("v64").unwrap().get("robins").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn include_file_missing_velocities_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.dfxi"), r#"Dfxi = { path = "x" }"#).unwrap();

        let mut tree = parse(
            r#"{
                MyKit = {
                    instruments = {
                        snare = { note = 38, include = "bad.dfxi" }
                    }
                }
            }"#,
        );
        let log = validate(&mut tree, dir.path());
        assert!(log.errors.iter().any(|e| matches!(e, FontError::IncludeFailed { .. })));
    }
}
