const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human readable size in base 1024, one decimal, trailing `.0` dropped.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut scaled = bytes as f64;
    let mut exponent = 0;
    while scaled >= 1024.0 && exponent < SIZE_UNITS.len() - 1 {
        scaled /= 1024.0;
        exponent += 1;
    }

    format!("{} {}", trim_decimal(scaled), SIZE_UNITS[exponent])
}

/// Millimetre total with one decimal, e.g. `150.5mm`.
pub fn format_length(millimetres: f64) -> String {
    format!("{:.1}mm", millimetres)
}

fn trim_decimal(value: f64) -> String {
    let rounded = format!("{:.1}", value);
    match rounded.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => rounded,
    }
}
