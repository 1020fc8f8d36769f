use serde_json::Value;
use std::io;

use super::is_row_set;

/// Write output as CSV to stdout.
///
/// Row sets (amortization years, cash-flow years, sensitivity rows) become
/// one CSV record per row with a header line. Anything else degrades to
/// field,value pairs. Undefined metrics serialize as empty cells.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some(rows) = find_row_set(value) {
        write_rows(&mut wtr, rows);
    } else {
        let flat = match value {
            Value::Object(map) => map.get("result").unwrap_or(value),
            _ => value,
        };
        let _ = wtr.write_record(["field", "value"]);
        if let Value::Object(map) = flat {
            for (key, val) in map {
                if !val.is_object() && !val.is_array() {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        } else {
            let _ = wtr.write_record(["value", &format_csv_value(flat)]);
        }
    }

    let _ = wtr.flush();
}

/// Locate the row set in the output: the value itself, the `result` field,
/// or the first array-of-objects field inside the result (e.g. `years`,
/// `cashflows`).
fn find_row_set(value: &Value) -> Option<&[Value]> {
    if is_row_set(value) {
        return value.as_array().map(Vec::as_slice);
    }

    let inner = match value {
        Value::Object(map) => map.get("result").unwrap_or(value),
        _ => value,
    };
    if is_row_set(inner) {
        return inner.as_array().map(Vec::as_slice);
    }
    if let Value::Object(map) = inner {
        for val in map.values() {
            if is_row_set(val) {
                return val.as_array().map(Vec::as_slice);
            }
        }
    }
    None
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };
    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for row in rows {
        if let Value::Object(map) = row {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&record);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
