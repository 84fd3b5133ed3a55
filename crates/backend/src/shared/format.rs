/// Форматирует число с разделителями тысяч (точками)
///
/// Используется в логе запросов для размера ответа: `1234567` -> `1.234.567`.
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push('.');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Длительность запроса для лога: миллисекунды, либо секунды для долгих
pub fn format_duration(elapsed: std::time::Duration) -> String {
    let ms = elapsed.as_millis();
    if ms < 10_000 {
        format!("{}ms", ms)
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}
