use crate::flow::Capacity;

const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

/// Human-readable binary size, e.g. `1.50 PiB`.
pub fn format_capacity(capacity: Capacity) -> String {
	let bytes = capacity.get();
	if bytes < 1024 {
		return format!("{bytes} B");
	}
	let mut value = capacity.as_f64();
	let mut unit = 0;
	while value >= 1024.0 && unit < UNITS.len() - 1 {
		value /= 1024.0;
		unit += 1;
	}
	format!("{value:.2} {}", UNITS[unit])
}
