use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::is_row_set;

/// Format output as tables using the tabled crate.
///
/// The engine produces three shapes: a bare row set (amortization years,
/// cash-flow years, sensitivity rows), a computation envelope whose `result`
/// holds rows or nested sections, and flat objects. Scalar fields become a
/// Field/Value table; every row set becomes its own table. Undefined metrics
/// (JSON null) render as "n/a", never as zero.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_section(result);
                print_envelope_footer(map);
            } else {
                print_section(value);
            }
        }
        _ => print_section(value),
    }
}

fn print_section(value: &Value) {
    match value {
        Value::Array(_) if is_row_set(value) => {
            if let Value::Array(rows) = value {
                print_rows(rows);
            }
        }
        Value::Object(map) => {
            // Scalars first, then nested sections and row sets
            let scalars: Vec<(&String, &Value)> = map
                .iter()
                .filter(|(_, v)| !v.is_object() && !v.is_array())
                .collect();
            if !scalars.is_empty() {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                for (key, val) in &scalars {
                    builder.push_record([key.as_str(), &format_value(val)]);
                }
                println!("{}", Table::from(builder));
            }

            for (key, val) in map {
                match val {
                    Value::Object(_) => {
                        println!("\n{}:", key);
                        print_section(val);
                    }
                    Value::Array(rows) if is_row_set(val) => {
                        println!("\n{}:", key);
                        print_rows(rows);
                    }
                    _ => {}
                }
            }
        }
        _ => println!("{}", format_value(value)),
    }
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };
    let headers: Vec<String> = first.keys().cloned().collect();

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(record);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_footer(envelope: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "n/a".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
