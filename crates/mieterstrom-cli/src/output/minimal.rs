use serde_json::Value;

/// Print just the headline value from the output.
///
/// Looks for the key metrics of this engine in priority order, descending
/// into the `result`/`metrics` envelope when present. An undefined metric
/// prints as "n/a" and is never coerced to a number.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);
    let scope = result
        .as_object()
        .and_then(|m| m.get("metrics"))
        .unwrap_or(result);

    let priority_keys = ["irr_equity", "npv_equity", "dscr_min", "annuity"];

    if let Value::Object(map) = scope {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                println!("{}", format_minimal(val));
                return;
            }
        }

        // Fall back to the first scalar field
        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_object() && !v.is_array()) {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(scope));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "n/a".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
